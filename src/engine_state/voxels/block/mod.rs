//! # Block Module
//!
//! This module provides the block catalog of the voxel engine: block type
//! definitions, the per-cell block state, the six block faces and the per-face
//! tint hook used while meshing.

use std::sync::Arc;

use crate::engine_state::rendering::material::{Color, SubmeshMaterial};

use block_side::BlockSide;
use block_type::BlockType;
use colormap::Colormap;

pub mod block_side;
pub mod block_type;
pub mod colormap;
pub mod registry;

/// The underlying integer type used to represent block type ids in memory.
pub type BlockTypeSize = u8;

/// Represents the content of a single voxel cell.
///
/// This is a lightweight structure that only stores the id of its block type. The
/// block properties are looked up from the registry. It is `Copy` and compares by
/// value; more per-instance data (orientation, metadata) can be added without
/// touching chunk storage.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute ensures a consistent memory layout. The all-zero value
/// is air, which is what new chunks are filled with.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlockState {
    /// The id of this cell's block type.
    pub block_type: BlockTypeSize,
}

impl BlockState {
    /// The state every chunk cell starts with.
    pub const AIR: BlockState = BlockState { block_type: 0 };

    /// Creates a state referring to the given block type.
    pub fn new(block_type: &BlockType) -> Self {
        BlockState {
            block_type: block_type.id(),
        }
    }

    /// Whether this state refers to the air block.
    pub fn is_air(&self) -> bool {
        *self == Self::AIR
    }
}

/// A single texture of a face's texture stack.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureResource {
    /// Name of the texture, resolved by the render backend.
    pub name: String,
    /// Whether the texture needs a blended (transparent) material.
    pub transparent: bool,
}

impl TextureResource {
    /// Creates an opaque texture reference.
    pub fn opaque(name: &str) -> Self {
        TextureResource {
            name: name.to_string(),
            transparent: false,
        }
    }

    /// Creates a transparent overlay texture reference.
    pub fn transparent(name: &str) -> Self {
        TextureResource {
            name: name.to_string(),
            transparent: true,
        }
    }
}

/// Per-face colour hook run for every submesh a block type emits.
#[derive(Clone, Debug, Default)]
pub enum SubmeshTint {
    /// Materials keep their neutral white colour.
    #[default]
    None,

    /// Every layer of every face is multiplied by the same colour (e.g. leaves).
    Uniform(Color),

    /// Grass style tint: the top base layer and the side overlay layer are coloured
    /// from a biome colormap sampled at the given climate.
    GrassColormap {
        /// Colormap indexed by temperature and humidity
        colormap: Arc<Colormap>,
        /// Temperature in `0..=1`
        temperature: f32,
        /// Humidity in `0..=1`
        humidity: f32,
    },
}

impl SubmeshTint {
    /// Adjusts the material of the submesh for `layer` of `side` of the block at the
    /// chunk-local position `(x, y, z)`.
    pub fn apply(
        &self,
        _x: i32,
        _y: i32,
        _z: i32,
        side: BlockSide,
        layer: usize,
        material: &mut SubmeshMaterial,
    ) {
        match self {
            SubmeshTint::None => {}
            SubmeshTint::Uniform(color) => material.color = *color,
            SubmeshTint::GrassColormap {
                colormap,
                temperature,
                humidity,
            } => {
                // The bottom is plain dirt, the top base layer is the grass itself and
                // the sides carry the grass in their overlay layer.
                let tinted = match side {
                    BlockSide::DOWN => false,
                    BlockSide::UP => layer == 0,
                    _ => layer == 1,
                };
                if tinted {
                    material.color = colormap.sample(*temperature, *humidity);
                }
            }
        }
    }
}
