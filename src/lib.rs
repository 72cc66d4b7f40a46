#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The core of a voxel world that is discovered incrementally around a moving viewer.
//!
//! This crate stores blocks in a sparse map of fixed-size chunks, generates new chunks
//! on background threads, turns them into cube geometry with hidden-face culling and
//! hands finished meshes to a rendering collaborator through a bounded queue.
//!
//! ## Key Modules
//!
//! * `config` - Runtime settings, loadable from JSON
//! * `core` - Concurrency primitives used throughout the engine
//! * `engine_state` - The world displayer plus rendering, voxels, and task management
//! * `error` - The error type shared by every module
//!
//! ## Architecture
//!
//! The engine follows a modular architecture with clear separation between:
//! * Voxel data (blocks, chunks, the world, structures, generators)
//! * Meshing (block data to vertices and per-material submeshes)
//! * Task scheduling and execution
//! * External collaborators behind traits (`RenderBackend`, `ViewerTracker`)
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::config::EngineConfig;
//! use voxel_world::engine_state::WorldDisplayer;
//! use voxel_world::engine_state::rendering::headless::{HeadlessBackend, ScriptedViewer};
//!
//! voxel_world::init_logging();
//! let config = EngineConfig::default();
//! let mut displayer = WorldDisplayer::new(&config, Box::new(HeadlessBackend::new())).unwrap();
//! let viewer = ScriptedViewer::new(vec![cgmath::Vector3::new(0.0, 1.0, 0.0)]);
//!
//! // Once per frame:
//! displayer.update_from_tracker(&viewer);
//! displayer.on_frame();
//! ```

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine_state::WorldDisplayer;
pub use error::{Result, VoxelError};

/// Routes `log` output to stdout, filtered by the `RUST_LOG` environment variable.
///
/// Calling it more than once is harmless; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}
