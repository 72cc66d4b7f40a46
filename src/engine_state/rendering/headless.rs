//! Headless collaborators.
//!
//! [`HeadlessBackend`] resolves every resource immediately and records what the
//! engine asked it to do instead of drawing anything. [`ScriptedViewer`] replays a
//! fixed path of viewer positions. Together they drive the full streaming pipeline
//! without a GPU or a tracking device, which is what the demo binary and the
//! integration tests use.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use cgmath::Vector3;
use futures::FutureExt;
use parking_lot::{Mutex, MutexGuard};

use crate::engine_state::voxels::block::TextureResource;

use super::{
    AnchorHandle, MaterialHandle, RenderBackend, RenderableHandle, ResourceFuture, Submesh,
    Vertex, ViewerTracker,
};

/// Geometry statistics of a renderable the headless backend built.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessRenderable {
    /// Number of distinct vertices
    pub vertex_count: usize,
    /// Number of submeshes
    pub submesh_count: usize,
    /// Total number of indices over all submeshes
    pub index_count: usize,
}

/// Everything the headless backend has been asked to do.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    /// Textures materials were requested for, in request order
    pub materials: Vec<TextureResource>,
    /// Every renderable ever built
    pub renderables: HashMap<RenderableHandle, HeadlessRenderable>,
    /// Renderables currently in the scene and their offsets
    pub placed: HashMap<RenderableHandle, Vector3<f32>>,
    /// Number of renderables removed from the scene
    pub removed: usize,
}

/// A [`RenderBackend`] that keeps a record instead of rendering.
///
/// Clones share the same scene, so a test can keep one clone and hand the other to
/// the engine.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    scene: Arc<Mutex<HeadlessScene>>,
    next_handle: Arc<AtomicU64>,
}

impl HeadlessBackend {
    /// Creates a backend with an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the recorded scene for inspection.
    pub fn scene(&self) -> MutexGuard<'_, HeadlessScene> {
        self.scene.lock()
    }

    /// Number of renderables currently placed.
    pub fn placed_count(&self) -> usize {
        self.scene.lock().placed.len()
    }

    fn next_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl RenderBackend for HeadlessBackend {
    fn resolve_material(&mut self, texture: &TextureResource) -> ResourceFuture<MaterialHandle> {
        self.scene.lock().materials.push(texture.clone());
        let handle = MaterialHandle(self.next_handle());
        futures::future::ready(Ok(handle)).boxed()
    }

    fn build_renderable(
        &mut self,
        vertices: Vec<Vertex>,
        submeshes: Vec<Submesh>,
    ) -> ResourceFuture<RenderableHandle> {
        let handle = RenderableHandle(self.next_handle());
        let renderable = HeadlessRenderable {
            vertex_count: vertices.len(),
            submesh_count: submeshes.len(),
            index_count: submeshes.iter().map(|submesh| submesh.indices.len()).sum(),
        };
        self.scene.lock().renderables.insert(handle, renderable);
        futures::future::ready(Ok(handle)).boxed()
    }

    fn place_in_scene(&mut self, handle: RenderableHandle, offset: Vector3<f32>) {
        self.scene.lock().placed.insert(handle, offset);
    }

    fn remove_from_scene(&mut self, handle: RenderableHandle) {
        let mut scene = self.scene.lock();
        if scene.placed.remove(&handle).is_some() {
            scene.removed += 1;
        }
    }
}

/// A [`ViewerTracker`] walking along a fixed list of positions.
#[derive(Clone, Debug)]
pub struct ScriptedViewer {
    path: Vec<Vector3<f32>>,
    cursor: usize,
    anchors_created: Arc<AtomicUsize>,
}

impl ScriptedViewer {
    /// Creates a viewer standing at the first position of `path`.
    pub fn new(path: Vec<Vector3<f32>>) -> Self {
        ScriptedViewer {
            path,
            cursor: 0,
            anchors_created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Moves to the next position. Returns `false` when the path is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.path.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Number of anchors created so far.
    pub fn anchors_created(&self) -> usize {
        self.anchors_created.load(Ordering::Relaxed)
    }
}

impl ViewerTracker for ScriptedViewer {
    fn current_viewer_position(&self) -> Vector3<f32> {
        self.path
            .get(self.cursor)
            .copied()
            .unwrap_or_else(|| Vector3::new(0.0, 0.0, 0.0))
    }

    fn create_anchor_at(&mut self, _hit: Vector3<f32>) -> AnchorHandle {
        AnchorHandle(self.anchors_created.fetch_add(1, Ordering::Relaxed) as u64)
    }
}
