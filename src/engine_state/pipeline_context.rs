//! Main-thread state of the streaming pipeline.
//!
//! Task results run on the main thread and need the world, the render backend and
//! the bookkeeping of which chunks are being generated or are currently shown. All of
//! it lives in [`PipelineContext`], owned by the task manager and handed to every
//! result in turn.
//!
//! Building a drawable is asynchronous on the backend side. The main thread never
//! blocks on it: unfinished builds are kept per chunk and polled once per frame.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::Vector3;
use futures::FutureExt;
use log::{debug, error, trace};

use crate::config::EngineConfig;
use crate::core::MtResource;

use super::rendering::{
    meshing::{BlockMesher, ChunkMeshBuildResult},
    tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    RenderBackend, RenderableHandle, ResourceFuture,
};
use super::task_management::task::Task;
use super::voxels::{
    generation::WorldGenerator, position::ChunkPosition,
    tasks::chunk_generation_task::ChunkGenerationTask, world::World,
};

/// A drawable the backend is still building.
struct PendingRenderable {
    future: ResourceFuture<RenderableHandle>,
    vertex_count: usize,
}

/// State shared by every task result on the main thread.
pub struct PipelineContext {
    /// The world. Workers only ever read it.
    pub world: MtResource<World>,
    generator: Arc<dyn WorldGenerator>,
    mesher: Arc<BlockMesher>,
    backend: Box<dyn RenderBackend>,
    /// The drawable currently shown for each chunk.
    visuals: HashMap<ChunkPosition, RenderableHandle>,
    /// At most one unfinished build per chunk, always of its newest mesh.
    pending_renderables: HashMap<ChunkPosition, PendingRenderable>,
    pending_generation: HashSet<ChunkPosition>,
    /// Last mesh revision handed out per chunk.
    requested_revisions: HashMap<ChunkPosition, u64>,
    /// Revision of the mesh currently installed per chunk, empty meshes included.
    installed_revisions: HashMap<ChunkPosition, u64>,
    scene_offset: Vector3<f32>,
    remesh_neighbors_on_insert: bool,
    meshes_installed: usize,
}

impl PipelineContext {
    /// Creates the context.
    pub fn new(
        world: MtResource<World>,
        generator: Arc<dyn WorldGenerator>,
        mesher: Arc<BlockMesher>,
        backend: Box<dyn RenderBackend>,
        config: &EngineConfig,
    ) -> Self {
        PipelineContext {
            world,
            generator,
            mesher,
            backend,
            visuals: HashMap::new(),
            pending_renderables: HashMap::new(),
            pending_generation: HashSet::new(),
            requested_revisions: HashMap::new(),
            installed_revisions: HashMap::new(),
            scene_offset: Vector3::from(config.scene_offset),
            remesh_neighbors_on_insert: config.remesh_neighbors_on_insert,
            meshes_installed: 0,
        }
    }

    /// Creates a generation task for `position` unless the chunk is already loaded
    /// or being generated. The position counts as pending until its result is handled.
    pub fn generation_task(&mut self, position: ChunkPosition) -> Option<Box<dyn Task + Send>> {
        if self.pending_generation.contains(&position) || self.world.get().has_chunk(position) {
            return None;
        }
        self.pending_generation.insert(position);
        Some(Box::new(ChunkGenerationTask::new(self.generator.clone(), position)))
    }

    /// Marks the generation of `position` as finished, successfully or not.
    pub fn finish_generation(&mut self, position: ChunkPosition) {
        self.pending_generation.remove(&position);
    }

    /// Creates a mesh task for `position` with a fresh revision.
    pub fn mesh_task(&mut self, position: ChunkPosition) -> Box<dyn Task + Send> {
        let revision = self.requested_revisions.entry(position).or_insert(0);
        *revision += 1;
        Box::new(ChunkMeshGenerationTask::new(
            self.world.clone(),
            self.mesher.clone(),
            position,
            *revision,
        ))
    }

    /// Replaces the visual of the mesh's chunk.
    ///
    /// An empty mesh only removes the old visual. Results older than the installed
    /// one are discarded, so a slow build never overwrites a newer edit. A non-empty
    /// mesh is handed to the backend; the old visual stays until the new drawable is
    /// ready, see [`Self::poll_renderables`].
    pub fn install_mesh(&mut self, revision: u64, mesh: ChunkMeshBuildResult) {
        let position = mesh.position;
        if self
            .installed_revisions
            .get(&position)
            .is_some_and(|installed| *installed > revision)
        {
            debug!("Discarding stale mesh {} for chunk {:?}", revision, position);
            return;
        }
        self.installed_revisions.insert(position, revision);
        // a newer mesh supersedes any build still running for the chunk
        if self.pending_renderables.remove(&position).is_some() {
            debug!("Superseded an unfinished build for chunk {:?}", position);
        }

        if mesh.is_empty() {
            if let Some(old) = self.visuals.remove(&position) {
                self.backend.remove_from_scene(old);
            }
            trace!("Chunk {:?} has no visible faces", position);
            return;
        }

        let vertex_count = mesh.vertices.len();
        let future = self.backend.build_renderable(mesh.vertices, mesh.submeshes);
        self.pending_renderables
            .insert(position, PendingRenderable { future, vertex_count });
        self.poll_renderables();
    }

    /// Places every drawable the backend finished building without blocking.
    ///
    /// Failed builds are logged and leave the chunk's previous visual in place.
    /// Returns the number of builds still running.
    pub fn poll_renderables(&mut self) -> usize {
        for (position, mut pending) in std::mem::take(&mut self.pending_renderables) {
            match (&mut pending.future).now_or_never() {
                Some(Ok(handle)) => self.place(position, handle, pending.vertex_count),
                Some(Err(err)) => {
                    error!("Failed to build renderable for chunk {:?}: {}", position, err)
                }
                None => {
                    self.pending_renderables.insert(position, pending);
                }
            }
        }
        self.pending_renderables.len()
    }

    fn place(&mut self, position: ChunkPosition, handle: RenderableHandle, vertex_count: usize) {
        if let Some(old) = self.visuals.insert(position, handle) {
            self.backend.remove_from_scene(old);
        }
        let offset = position.as_vector(self.mesher.scale()) + self.scene_offset;
        self.backend.place_in_scene(handle, offset);
        self.meshes_installed += 1;
        debug!(
            "Installed mesh for chunk {:?} with {} vertices",
            position, vertex_count
        );
    }

    /// The drawable currently shown for `position`.
    pub fn visual(&self, position: ChunkPosition) -> Option<RenderableHandle> {
        self.visuals.get(&position).copied()
    }

    /// Number of chunks currently shown.
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Whether `position` is being generated.
    pub fn is_pending(&self, position: ChunkPosition) -> bool {
        self.pending_generation.contains(&position)
    }

    /// Number of drawables the backend is still building.
    pub fn pending_renderable_count(&self) -> usize {
        self.pending_renderables.len()
    }

    /// Number of chunks being generated.
    pub fn pending_generation_count(&self) -> usize {
        self.pending_generation.len()
    }

    /// Number of non-empty meshes installed so far.
    pub fn meshes_installed(&self) -> usize {
        self.meshes_installed
    }

    /// Whether loading a chunk re-meshes its loaded face neighbours.
    pub fn remesh_neighbors_on_insert(&self) -> bool {
        self.remesh_neighbors_on_insert
    }

    /// The block mesher.
    pub fn mesher(&self) -> &Arc<BlockMesher> {
        &self.mesher
    }
}

#[cfg(test)]
mod tests {
    use futures::channel::oneshot;
    use parking_lot::Mutex;

    use super::*;
    use crate::engine_state::rendering::{
        headless::HeadlessBackend, MaterialHandle, ResourceFuture, Submesh, Vertex,
    };
    use crate::engine_state::task_management::task::TaskResult;
    use crate::engine_state::voxels::{
        block::{BlockState, TextureResource},
        chunk::Chunk,
        position::BlockPos,
    };
    use crate::error::VoxelError;
    use crate::testing;

    fn run(context: &mut PipelineContext, task: Box<dyn Task + Send>) -> Vec<Box<dyn Task + Send>> {
        task.process().handle_result(context)
    }

    /// Generates `position` and runs the resulting mesh tasks.
    fn load(context: &mut PipelineContext, position: ChunkPosition) {
        let task = context.generation_task(position).unwrap();
        for follow_up in run(context, task) {
            run(context, follow_up);
        }
    }

    #[test]
    fn generation_is_requested_once_per_chunk() {
        let (mut context, _) = testing::pipeline_context_with_backend();
        let position = ChunkPosition::new(0, 0, 0);

        let task = context.generation_task(position).unwrap();
        assert!(context.generation_task(position).is_none());
        assert!(context.is_pending(position));

        let follow_ups = run(&mut context, task);
        assert!(!context.is_pending(position));
        assert!(context.world.get().has_chunk(position));
        assert_eq!(follow_ups.len(), 1);
        assert!(context.generation_task(position).is_none());
    }

    #[test]
    fn inserting_a_chunk_remeshes_loaded_neighbours() {
        let (mut context, _) = testing::pipeline_context_with_backend();
        load(&mut context, ChunkPosition::new(0, 0, 0));

        let task = context.generation_task(ChunkPosition::new(1, 0, 0)).unwrap();
        assert_eq!(run(&mut context, task).len(), 2);
    }

    #[test]
    fn mesh_is_placed_at_the_chunk_offset() {
        let (mut context, backend) = testing::pipeline_context_with_backend();
        let position = ChunkPosition::new(1, 0, -1);
        load(&mut context, position);

        let handle = context.visual(position).unwrap();
        let offset = backend.scene().placed[&handle];
        assert_eq!(offset, Vector3::new(16.0, -1.0, -16.0));
        assert_eq!(context.meshes_installed(), 1);
    }

    #[test]
    fn empty_mesh_removes_the_old_visual() {
        let (mut context, backend) = testing::pipeline_context_with_backend();
        let position = ChunkPosition::new(0, 0, 0);
        load(&mut context, position);
        assert_eq!(backend.placed_count(), 1);

        {
            let mut world = context.world.get_mut();
            for x in 0..16 {
                for z in 0..16 {
                    world.set_block(BlockPos::new(x, 0, z), BlockState::AIR).unwrap();
                }
            }
        }
        let task = context.mesh_task(position);
        run(&mut context, task);

        assert_eq!(context.visual(position), None);
        assert_eq!(backend.placed_count(), 0);
        assert_eq!(backend.scene().removed, 1);
    }

    #[test]
    fn stale_mesh_results_are_discarded() {
        let (mut context, backend) = testing::pipeline_context_with_backend();
        let position = ChunkPosition::new(0, 0, 0);
        let stone = testing::registry().by_name("stone").unwrap().default_state();
        let mut chunk = Chunk::new(position);
        chunk.set_local(3, 3, 3, stone).unwrap();
        context.world.get_mut().insert_chunk(chunk);

        let older = context.mesh_task(position).process();
        let newer = context.mesh_task(position).process();
        newer.handle_result(&mut context);
        let installed = context.visual(position).unwrap();
        older.handle_result(&mut context);

        assert_eq!(context.visual(position), Some(installed));
        assert_eq!(context.meshes_installed(), 1);
        assert_eq!(backend.placed_count(), 1);
    }

    struct FailingBackend(HeadlessBackend);

    impl RenderBackend for FailingBackend {
        fn resolve_material(&mut self, texture: &TextureResource) -> ResourceFuture<MaterialHandle> {
            self.0.resolve_material(texture)
        }

        fn build_renderable(
            &mut self,
            _vertices: Vec<Vertex>,
            _submeshes: Vec<Submesh>,
        ) -> ResourceFuture<RenderableHandle> {
            Box::pin(async { Err(VoxelError::Backend("out of memory".to_string())) })
        }

        fn place_in_scene(&mut self, handle: RenderableHandle, offset: Vector3<f32>) {
            self.0.place_in_scene(handle, offset)
        }

        fn remove_from_scene(&mut self, handle: RenderableHandle) {
            self.0.remove_from_scene(handle)
        }
    }

    #[test]
    fn failed_backend_build_leaves_no_visual() {
        let registry = testing::registry();
        let mut context = PipelineContext::new(
            MtResource::new(World::new()),
            testing::surface_generator(&registry),
            Arc::new(testing::mesher(&registry)),
            Box::new(FailingBackend(HeadlessBackend::new())),
            &EngineConfig::default(),
        );
        let position = ChunkPosition::new(0, 0, 0);
        load(&mut context, position);

        assert!(context.world.get().has_chunk(position));
        assert_eq!(context.visual(position), None);
        assert_eq!(context.meshes_installed(), 0);
    }

    /// Finishes a build only when the test sends its handle.
    struct DeferredBackend {
        inner: HeadlessBackend,
        builds: Arc<Mutex<Vec<oneshot::Sender<RenderableHandle>>>>,
    }

    impl RenderBackend for DeferredBackend {
        fn resolve_material(&mut self, texture: &TextureResource) -> ResourceFuture<MaterialHandle> {
            self.inner.resolve_material(texture)
        }

        fn build_renderable(
            &mut self,
            _vertices: Vec<Vertex>,
            _submeshes: Vec<Submesh>,
        ) -> ResourceFuture<RenderableHandle> {
            let (sender, receiver) = oneshot::channel();
            self.builds.lock().push(sender);
            Box::pin(async move {
                receiver
                    .await
                    .map_err(|_| VoxelError::Backend("build cancelled".to_string()))
            })
        }

        fn place_in_scene(&mut self, handle: RenderableHandle, offset: Vector3<f32>) {
            self.inner.place_in_scene(handle, offset)
        }

        fn remove_from_scene(&mut self, handle: RenderableHandle) {
            self.inner.remove_from_scene(handle)
        }
    }

    #[test]
    fn slow_builds_are_placed_once_they_finish() {
        let registry = testing::registry();
        let scene = HeadlessBackend::new();
        let builds = Arc::new(Mutex::new(Vec::new()));
        let mut context = PipelineContext::new(
            MtResource::new(World::new()),
            testing::surface_generator(&registry),
            Arc::new(testing::mesher(&registry)),
            Box::new(DeferredBackend {
                inner: scene.clone(),
                builds: builds.clone(),
            }),
            &EngineConfig::default(),
        );
        let position = ChunkPosition::new(0, 0, 0);
        load(&mut context, position);

        assert_eq!(context.visual(position), None);
        assert_eq!(context.poll_renderables(), 1);

        let sender = builds.lock().pop().unwrap();
        sender.send(RenderableHandle(42)).unwrap();
        assert_eq!(context.poll_renderables(), 0);
        assert_eq!(context.visual(position), Some(RenderableHandle(42)));
        assert_eq!(scene.placed_count(), 1);
        assert_eq!(context.meshes_installed(), 1);
    }

    #[test]
    fn a_newer_mesh_supersedes_an_unfinished_build() {
        let registry = testing::registry();
        let builds = Arc::new(Mutex::new(Vec::new()));
        let mut context = PipelineContext::new(
            MtResource::new(World::new()),
            testing::surface_generator(&registry),
            Arc::new(testing::mesher(&registry)),
            Box::new(DeferredBackend {
                inner: HeadlessBackend::new(),
                builds: builds.clone(),
            }),
            &EngineConfig::default(),
        );
        let position = ChunkPosition::new(0, 0, 0);
        load(&mut context, position);

        let task = context.mesh_task(position);
        run(&mut context, task);
        assert_eq!(context.pending_renderable_count(), 1);

        // the first build's future was dropped, so its sender is closed
        let mut senders = std::mem::take(&mut *builds.lock());
        let newest = senders.pop().unwrap();
        assert!(senders.pop().unwrap().is_canceled());
        newest.send(RenderableHandle(7)).unwrap();
        context.poll_renderables();
        assert_eq!(context.visual(position), Some(RenderableHandle(7)));
    }
}
