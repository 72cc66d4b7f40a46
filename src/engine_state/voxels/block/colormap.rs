//! # Colormap Module
//!
//! Biome colormaps map a (temperature, humidity) climate to a colour, the way grass
//! colour is usually looked up in block games. A colormap is either decoded from a
//! PNG or generated as a built-in gradient.

use std::{fmt, path::Path};

use image::{Rgba, RgbaImage};

use crate::engine_state::rendering::material::Color;
use crate::error::Result;

/// Edge length of the built-in colormap.
const DEFAULT_COLORMAP_SIZE: u32 = 256;

/// A climate indexed colour lookup table.
pub struct Colormap {
    image: RgbaImage,
}

impl Colormap {
    /// Decodes a colormap from an image file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path)?.to_rgba8();
        Ok(Colormap { image })
    }

    /// Wraps an already decoded image.
    pub fn from_image(image: RgbaImage) -> Self {
        Colormap { image }
    }

    /// A built-in grass colormap.
    ///
    /// Interpolates between a hot and dry yellow (bottom left), a cold blue-green
    /// (right edge) and a lush green (top left).
    pub fn default_grass() -> Self {
        const DRY: [f32; 3] = [191.0, 183.0, 85.0];
        const COLD: [f32; 3] = [128.0, 180.0, 151.0];
        const LUSH: [f32; 3] = [71.0, 205.0, 51.0];

        let max = (DEFAULT_COLORMAP_SIZE - 1) as f32;
        let image = RgbaImage::from_fn(DEFAULT_COLORMAP_SIZE, DEFAULT_COLORMAP_SIZE, |x, y| {
            let coldness = x as f32 / max;
            let dryness = y as f32 / max;
            let mut rgb = [0u8; 3];
            for (channel, value) in rgb.iter_mut().enumerate() {
                let warm = LUSH[channel] + (DRY[channel] - LUSH[channel]) * dryness;
                *value = (warm + (COLD[channel] - warm) * coldness).round() as u8;
            }
            Rgba([rgb[0], rgb[1], rgb[2], 255])
        });
        Colormap { image }
    }

    /// Looks up the colour for a climate. Both inputs are clamped to `0..=1`.
    pub fn sample(&self, temperature: f32, humidity: f32) -> Color {
        let temperature = temperature.clamp(0.0, 1.0);
        let humidity = humidity.clamp(0.0, 1.0) * temperature;
        let max_x = self.image.width().saturating_sub(1);
        let max_y = self.image.height().saturating_sub(1);
        let x = (((1.0 - temperature) * max_x as f32) as u32).min(max_x);
        let y = (((1.0 - humidity) * max_y as f32) as u32).min(max_y);
        let pixel = self.image.get_pixel(x, y).0;
        [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
            pixel[3] as f32 / 255.0,
        ]
    }
}

impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colormap")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reads_the_expected_pixel() {
        let mut image = RgbaImage::new(256, 256);
        // temperature 0.5, humidity 1.0 -> x = 127, y = 127
        image.put_pixel(127, 127, Rgba([255, 0, 0, 255]));
        let colormap = Colormap::from_image(image);
        assert_eq!(colormap.sample(0.5, 1.0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn sample_scales_to_the_image_size() {
        let mut image = RgbaImage::from_pixel(5, 3, Rgba([0, 255, 0, 255]));
        // temperature 0.5, humidity 1.0 -> x = 2, y = 1
        image.put_pixel(2, 1, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 255, 255]));
        let colormap = Colormap::from_image(image);

        assert_eq!(colormap.sample(0.5, 1.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(colormap.sample(1.0, 1.0), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(colormap.sample(0.0, 0.0), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn default_grass_is_opaque_and_green_when_lush() {
        let color = Colormap::default_grass().sample(1.0, 1.0);
        assert_eq!(color[3], 1.0);
        assert!(color[1] > color[0] && color[1] > color[2]);
    }
}
