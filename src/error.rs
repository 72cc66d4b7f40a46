//! # Error Module
//!
//! A single error type shared by every part of the voxel core. The variants follow
//! the failure classes the engine distinguishes:
//!
//! * **Bounds** - a coordinate outside a chunk or structure extent
//! * **Registry** - an unknown block id, name or synonym, or a malformed block definition
//! * **Format** - a malformed structure resource
//! * **Resource not ready** - a material requested before its asynchronous load finished
//!
//! Errors abort the operation that produced them (one chunk generation, one mesh build,
//! one structure load). The streaming pipeline logs them and carries on with the next
//! unit of work.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VoxelError>;

/// Every failure the voxel core can report.
#[derive(Debug, Error)]
pub enum VoxelError {
    /// A coordinate fell outside the extent of a chunk or structure.
    #[error("coordinate ({x}, {y}, {z}) is outside of the {extent} bounds")]
    OutOfBounds {
        /// X component of the rejected coordinate
        x: i32,
        /// Y component of the rejected coordinate
        y: i32,
        /// Z component of the rejected coordinate
        z: i32,
        /// What was indexed, e.g. "chunk" or "structure"
        extent: &'static str,
    },

    /// A block lookup failed or a block definition broke a registry invariant.
    #[error("block registry error: {0}")]
    Registry(String),

    /// A structure resource could not be parsed.
    #[error("structure format error on line {line}: {message}")]
    Format {
        /// 1-based line number, or 0 for errors found after the last line
        line: usize,
        /// Human readable description of the problem
        message: String,
    },

    /// A material layer was used before its asynchronous load completed.
    #[error("material for texture '{texture}' is not resolved yet")]
    ResourceNotReady {
        /// Name of the texture whose material is missing
        texture: String,
    },

    /// The rendering collaborator failed to produce a resource.
    #[error("render backend error: {0}")]
    Backend(String),

    /// Reading a resource or configuration file failed.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// The file that could not be read
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The engine configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A colormap image could not be decoded.
    #[error("failed to load colormap: {0}")]
    Image(#[from] image::ImageError),
}

impl VoxelError {
    /// Shorthand for building a [`VoxelError::Format`].
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        VoxelError::Format {
            line,
            message: message.into(),
        }
    }
}
