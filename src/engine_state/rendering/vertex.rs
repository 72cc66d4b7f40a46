//! Vertex data structure for chunk geometry.
//!
//! This module defines the vertex format produced by the mesher and consumed by the
//! render backend.

use cgmath::Vector3;

/// A vertex of chunk geometry.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position relative to the chunk origin, in scene units
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
    /// UV texture coordinates (normalized 0.0-1.0)
    pub uv: [f32; 2],
}

impl Vertex {
    /// Creates a new vertex.
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>, uv: [f32; 2]) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
            uv,
        }
    }

    /// Bitwise identity of the vertex, used to deduplicate vertices with exactly
    /// equal attributes.
    pub(crate) fn key(&self) -> [u32; 8] {
        bytemuck::cast(*self)
    }
}
