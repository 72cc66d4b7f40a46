//! # Engine Configuration
//!
//! Runtime settings for the streaming pipeline. Every field has a default so a
//! configuration file only needs to mention what it changes:
//!
//! ```json
//! { "render_distance": 2, "seed": 1337 }
//! ```

use std::{path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::error::{Result, VoxelError};

/// Settings consumed by the world displayer, the worker pool and the generators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chebyshev radius, in chunks, of the cube kept generated around the viewer.
    pub render_distance: i32,
    /// Number of background worker threads.
    pub worker_count: usize,
    /// Capacity of the bounded queue carrying finished work back to the main thread.
    pub result_queue_capacity: usize,
    /// How long a worker waits on a full result queue before dropping its result.
    pub result_send_timeout_ms: u64,
    /// Edge length of one block in scene units.
    pub world_scale: f32,
    /// Seed for the shared random source. A random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Probability that a freshly generated chunk receives a tree.
    pub tree_chance: f32,
    /// Local height at which trees are planted. `None` picks a random height.
    pub tree_base_y: Option<i32>,
    /// Extra translation applied to every chunk visual when it is placed in the scene.
    pub scene_offset: [f32; 3],
    /// Re-mesh already loaded face neighbours when a new chunk is inserted.
    pub remesh_neighbors_on_insert: bool,
    /// Optional PNG used to tint grass. A built-in gradient is used otherwise.
    pub grass_colormap: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            render_distance: 4,
            worker_count: 4,
            result_queue_capacity: 100,
            result_send_timeout_ms: 50,
            world_scale: 1.0,
            seed: None,
            tree_chance: 1.0,
            tree_base_y: Some(1),
            scene_offset: [0.0, -1.0, 0.0],
            remesh_neighbors_on_insert: true,
            grass_colormap: None,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VoxelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// The result queue send timeout as a [`Duration`].
    pub fn result_send_timeout(&self) -> Duration {
        Duration::from_millis(self.result_send_timeout_ms)
    }

    /// Returns the configured seed, or draws one from the process entropy source.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| fastrand::u64(..))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_streaming_expectations() {
        let config = EngineConfig::default();
        assert_eq!(config.render_distance, 4);
        assert_eq!(config.result_queue_capacity, 100);
        assert_eq!(config.world_scale, 1.0);
        assert_eq!(config.scene_offset, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = EngineConfig::from_json_str(r#"{ "render_distance": 2, "seed": 7 }"#).unwrap();
        assert_eq!(config.render_distance, 2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.resolve_seed(), 7);
        assert_eq!(config.worker_count, 4);
    }

    #[test]
    fn load_reads_file_and_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "worker_count": 1, "tree_base_y": null }}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.worker_count, 1);
        assert_eq!(config.tree_base_y, None);

        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(VoxelError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.json"),
            Err(VoxelError::Io { .. })
        ));
    }
}
