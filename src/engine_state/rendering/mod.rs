//! Rendering boundary of the voxel engine.
//!
//! The core never talks to a GPU or a scene graph directly. It produces plain
//! geometry (vertices plus per-material submeshes) and hands it to a [`RenderBackend`],
//! which turns it into something drawable and places it in the scene. The viewer
//! position comes from a [`ViewerTracker`].
//!
//! Both collaborators hand out opaque handles. Resource creation is asynchronous on
//! real backends, so it is expressed as a [`ResourceFuture`] which the engine either
//! polls or blocks on from the main thread.

use cgmath::Vector3;
use futures::future::BoxFuture;

use crate::engine_state::voxels::block::TextureResource;
use crate::error::Result;

pub mod headless;
pub mod material;
pub mod meshing;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use material::{Color, MaterialLibrary, MaterialRequests, SubmeshMaterial};
pub use meshing::{BlockMesher, ChunkMeshBuildResult, Submesh};
pub use vertex::Vertex;

/// A resource that becomes available later.
pub type ResourceFuture<T> = BoxFuture<'static, Result<T>>;

/// Opaque reference to a material created by the render backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Opaque reference to a drawable built from chunk geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderableHandle(pub u64);

/// Opaque reference to a tracked anchor in the viewer's space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnchorHandle(pub u64);

/// Creates and places rendering resources.
///
/// All methods are called from the main thread only.
pub trait RenderBackend {
    /// Starts creating a material for a texture. Transparent textures need a blended material.
    fn resolve_material(&mut self, texture: &TextureResource) -> ResourceFuture<MaterialHandle>;

    /// Starts building a drawable from chunk geometry.
    fn build_renderable(
        &mut self,
        vertices: Vec<Vertex>,
        submeshes: Vec<Submesh>,
    ) -> ResourceFuture<RenderableHandle>;

    /// Shows a drawable at `offset` relative to the world anchor.
    fn place_in_scene(&mut self, handle: RenderableHandle, offset: Vector3<f32>);

    /// Removes a drawable from the scene and releases it.
    fn remove_from_scene(&mut self, handle: RenderableHandle);
}

/// Reports where the viewer is.
pub trait ViewerTracker {
    /// The viewer position in tracking space.
    fn current_viewer_position(&self) -> Vector3<f32>;

    /// Pins an anchor at a point the user picked, typically a detected plane.
    fn create_anchor_at(&mut self, hit: Vector3<f32>) -> AnchorHandle;
}
