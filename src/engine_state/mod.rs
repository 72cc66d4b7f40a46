//! # Engine State Module
//!
//! The streaming side of the engine: it follows the viewer, generates the chunks
//! around it and keeps one visual per chunk in the scene.
//!
//! ## Key Components
//!
//! * `WorldDisplayer` - The main state container, driven once per frame
//! * `pipeline_context` - Main-thread state that task results update
//! * `rendering` - Render backend boundary, materials and chunk meshing
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, structures and world generation
//!
//! ## Architecture
//!
//! Work flows through a staged pipeline rather than callbacks. The displayer
//! publishes chunk generation tasks, generation results insert chunks and publish
//! mesh tasks, and mesh results install visuals through the render backend. Every
//! result is handled on the main thread from `WorldDisplayer::on_frame`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cgmath::Vector3;
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info};
use web_time::Instant;

use crate::{
    config::EngineConfig,
    core::MtResource,
    error::Result,
};
use pipeline_context::PipelineContext;
use rendering::{
    material::MaterialRequests, meshing::BlockMesher, AnchorHandle, RenderBackend,
    RenderableHandle, ViewerTracker,
};
use task_management::TaskManager;
use voxels::{
    block::{block_side::BlockSide, colormap::Colormap, registry::BlockRegistry, BlockState},
    generation::{GeneratorSequence, WorldGenerator},
    position::{BlockPos, ChunkPosition},
    world::World,
};

pub mod pipeline_context;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Where the displayer is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayState {
    /// No viewer position has been reported yet.
    Idle,
    /// Chunks are kept generated around `chunk`.
    Tracking {
        /// The chunk the viewer is in
        chunk: ChunkPosition,
    },
}

/// The main state container for the voxel world.
///
/// This struct owns the world, the worker pool and the render backend (through the
/// task manager) and coordinates their interactions.
///
/// # Examples
///
/// ```
/// use voxel_world::config::EngineConfig;
/// use voxel_world::engine_state::WorldDisplayer;
/// use voxel_world::engine_state::rendering::headless::HeadlessBackend;
///
/// let config = EngineConfig { render_distance: 1, seed: Some(7), ..EngineConfig::default() };
/// let mut displayer = WorldDisplayer::new(&config, Box::new(HeadlessBackend::new())).unwrap();
///
/// displayer.on_viewer_moved(cgmath::Vector3::new(0.5, 1.5, 0.5));
/// assert!(displayer.settle(std::time::Duration::from_secs(10)));
/// assert_eq!(displayer.world().get().chunk_count(), 27);
/// ```
pub struct WorldDisplayer {
    /// Task manager for asynchronous operations, owning the pipeline state
    task_manager: TaskManager,
    /// Block catalog shared with the mesher
    registry: Arc<BlockRegistry>,
    state: DisplayState,
    render_distance: i32,
    /// Positions reported by the world's block-change listener
    dirty_blocks: Receiver<BlockPos>,
    /// Tracking-space position of the world origin
    anchor_origin: Vector3<f32>,
    scale: f32,
    scene_offset: Vector3<f32>,
}

impl WorldDisplayer {
    /// Creates a displayer with the standard blocks and a grass and tree generator.
    ///
    /// Materials for every block texture are requested from `backend` and waited for
    /// before the first chunk can be meshed.
    ///
    /// # Errors
    /// Fails if the colormap cannot be loaded, a material cannot be resolved or the
    /// tree structure does not fit the configured generator.
    pub fn new(config: &EngineConfig, mut backend: Box<dyn RenderBackend>) -> Result<Self> {
        let colormap = match &config.grass_colormap {
            Some(path) => Colormap::load(path)?,
            None => Colormap::default_grass(),
        };
        let registry = Arc::new(BlockRegistry::register_all(Arc::new(colormap))?);

        let requests = MaterialRequests::request_all(&registry, backend.as_mut());
        info!("Waiting for {} materials", requests.pending_count());
        let materials = Arc::new(requests.resolve_all()?);

        let mesher = Arc::new(BlockMesher::new(registry.clone(), materials, config.world_scale));
        let seed = config.resolve_seed();
        info!("World seed: {}", seed);
        let generator = Arc::new(GeneratorSequence::surface_with_trees(&registry, config, seed)?);

        Ok(Self::with_parts(config, registry, mesher, generator, backend))
    }

    /// Creates a displayer from already built parts.
    pub fn with_parts(
        config: &EngineConfig,
        registry: Arc<BlockRegistry>,
        mesher: Arc<BlockMesher>,
        generator: Arc<dyn WorldGenerator>,
        backend: Box<dyn RenderBackend>,
    ) -> Self {
        let (dirty_sender, dirty_blocks) = unbounded();
        let mut world = World::new();
        world.add_block_change_listener(Box::new(move |pos, _| {
            // The displayer owns the receiver; a send only fails while it is dropped.
            let _ = dirty_sender.send(pos);
        }));

        let scale = mesher.scale();
        let context = PipelineContext::new(MtResource::new(world), generator, mesher, backend, config);
        let task_manager = TaskManager::new(
            config.worker_count,
            config.result_queue_capacity,
            config.result_send_timeout(),
            context,
        );

        WorldDisplayer {
            task_manager,
            registry,
            state: DisplayState::Idle,
            render_distance: config.render_distance.max(0),
            dirty_blocks,
            anchor_origin: Vector3::new(0.0, 0.0, 0.0),
            scale,
            scene_offset: Vector3::from(config.scene_offset),
        }
    }

    /// Reacts to a viewer position given in scene space.
    ///
    /// Nothing happens while the viewer stays in the same chunk. Otherwise every
    /// chunk within the render distance that is neither loaded nor being generated
    /// is scheduled for generation. Returns the number of chunks scheduled.
    pub fn on_viewer_moved(&mut self, position: Vector3<f32>) -> usize {
        let block = BlockPos::of_vector((position - self.scene_offset) / self.scale);
        let chunk = block.chunk_position();
        if self.state == (DisplayState::Tracking { chunk }) {
            return 0;
        }
        info!("Viewer entered chunk {:?}", chunk);
        self.state = DisplayState::Tracking { chunk };

        let mut scheduled = 0;
        for position in chunk.iterate_range(self.render_distance) {
            if let Some(task) = self.task_manager.context_mut().generation_task(position) {
                self.task_manager.publish_task(task);
                scheduled += 1;
            }
        }
        debug!("Scheduled {} chunks around {:?}", scheduled, chunk);
        scheduled
    }

    /// Reads the viewer from `tracker` and reacts to it like [`Self::on_viewer_moved`].
    pub fn update_from_tracker(&mut self, tracker: &dyn ViewerTracker) -> usize {
        let position = self.viewer_position_relative(tracker.current_viewer_position());
        self.on_viewer_moved(position)
    }

    /// Converts a tracking-space position into scene space.
    pub fn viewer_position_relative(&self, local: Vector3<f32>) -> Vector3<f32> {
        local - self.anchor_origin
    }

    /// Moves the world origin to `origin` in tracking space.
    pub fn set_anchor_origin(&mut self, origin: Vector3<f32>) {
        self.anchor_origin = origin;
    }

    /// Pins the world to a point the user picked and makes it the new origin.
    pub fn place_anchor(&mut self, tracker: &mut dyn ViewerTracker, hit: Vector3<f32>) -> AnchorHandle {
        let handle = tracker.create_anchor_at(hit);
        self.set_anchor_origin(hit);
        info!("World anchored at {:?}", hit);
        handle
    }

    /// Changes one block. The affected chunks are re-meshed on the next frame.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Result<()> {
        self.task_manager.context().world.get_mut().set_block(pos, state)
    }

    /// Runs one frame of the pipeline.
    ///
    /// Schedules re-meshing for chunks touched by block changes, handles every
    /// finished task, places drawables the backend finished and hands queued tasks
    /// to idle workers.
    pub fn on_frame(&mut self) {
        let dirty_chunks = self.collect_dirty_chunks();
        for position in dirty_chunks {
            let task = self.task_manager.context_mut().mesh_task(position);
            self.task_manager.publish_task(task);
        }

        self.task_manager.process_completed_tasks();
        self.task_manager.context_mut().poll_renderables();
        self.task_manager.process_queued_tasks();
    }

    /// Chunks to re-mesh for the block changes reported since the last frame.
    ///
    /// A change on a chunk border can expose or hide a face of the neighbouring
    /// chunk, so loaded neighbours across that border are included.
    fn collect_dirty_chunks(&self) -> HashSet<ChunkPosition> {
        let mut dirty = HashSet::new();
        let world = self.task_manager.context().world.get();
        for pos in self.dirty_blocks.try_iter() {
            let chunk = pos.chunk_position();
            dirty.insert(chunk);
            for side in BlockSide::all() {
                let neighbor = pos.offset(side).chunk_position();
                if neighbor != chunk && world.has_chunk(neighbor) {
                    dirty.insert(neighbor);
                }
            }
        }
        dirty
    }

    /// Runs frames until the pipeline has no outstanding work or `timeout` passes.
    ///
    /// Returns whether the pipeline went idle.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.on_frame();
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Whether no generation, meshing or re-meshing is outstanding.
    pub fn is_idle(&self) -> bool {
        self.dirty_blocks.is_empty()
            && self.task_manager.is_idle()
            && self.task_manager.context().pending_renderable_count() == 0
    }

    /// The current lifecycle state.
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// The world.
    pub fn world(&self) -> &MtResource<World> {
        &self.task_manager.context().world
    }

    /// The block catalog.
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// The visual currently shown for a chunk.
    pub fn visual_for(&self, position: ChunkPosition) -> Option<RenderableHandle> {
        self.task_manager.context().visual(position)
    }

    /// The main-thread pipeline state.
    pub fn context(&self) -> &PipelineContext {
        self.task_manager.context()
    }

    /// Number of task results dropped because the result queue was full.
    ///
    /// Their tasks were published again, so this only measures back-pressure.
    pub fn dropped_results(&self) -> usize {
        self.task_manager.dropped_results()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::headless::{HeadlessBackend, ScriptedViewer};
    use crate::testing;

    fn displayer(render_distance: i32) -> (WorldDisplayer, HeadlessBackend) {
        let config = EngineConfig {
            render_distance,
            worker_count: 2,
            ..EngineConfig::default()
        };
        let registry = testing::registry();
        let backend = HeadlessBackend::new();
        let displayer = WorldDisplayer::with_parts(
            &config,
            registry.clone(),
            Arc::new(testing::mesher(&registry)),
            testing::surface_generator(&registry),
            Box::new(backend.clone()),
        );
        (displayer, backend)
    }

    #[test]
    fn starts_idle_and_tracks_the_viewer_chunk() {
        let (mut displayer, _) = displayer(0);
        assert_eq!(displayer.state(), DisplayState::Idle);

        assert_eq!(displayer.on_viewer_moved(Vector3::new(20.0, 1.5, -3.0)), 1);
        assert_eq!(
            displayer.state(),
            DisplayState::Tracking {
                chunk: ChunkPosition::new(1, 0, -1)
            }
        );
        // same chunk, nothing new
        assert_eq!(displayer.on_viewer_moved(Vector3::new(21.0, 2.5, -4.0)), 0);
    }

    #[test]
    fn chunks_already_pending_are_not_requested_twice() {
        let (mut displayer, _) = displayer(1);
        assert_eq!(displayer.on_viewer_moved(Vector3::new(0.5, 1.5, 0.5)), 27);
        // one chunk over, only the new slab is missing
        assert_eq!(displayer.on_viewer_moved(Vector3::new(16.5, 1.5, 0.5)), 9);
        assert!(displayer.settle(Duration::from_secs(10)));
        assert_eq!(displayer.world().get().chunk_count(), 36);
    }

    #[test]
    fn viewer_position_is_relative_to_the_anchor() {
        let (mut displayer, _) = displayer(0);
        let mut viewer = ScriptedViewer::new(vec![Vector3::new(100.0, 1.0, 100.0)]);

        displayer.place_anchor(&mut viewer, Vector3::new(100.0, 0.0, 100.0));
        assert_eq!(viewer.anchors_created(), 1);
        assert_eq!(
            displayer.viewer_position_relative(Vector3::new(101.0, 2.0, 99.0)),
            Vector3::new(1.0, 2.0, -1.0)
        );

        displayer.update_from_tracker(&viewer);
        assert_eq!(
            displayer.state(),
            DisplayState::Tracking {
                chunk: ChunkPosition::new(0, 0, 0)
            }
        );
    }

    #[test]
    fn editing_a_border_block_remeshes_the_neighbour() {
        let (mut displayer, backend) = displayer(1);
        displayer.on_viewer_moved(Vector3::new(0.5, 1.5, 0.5));
        assert!(displayer.settle(Duration::from_secs(10)));
        let installed = displayer.context().meshes_installed();
        let before = displayer.visual_for(ChunkPosition::new(-1, 0, 0)).unwrap();

        let stone = displayer.registry().by_name("stone").unwrap().default_state();
        displayer.set_block(BlockPos::new(0, 1, 0), stone).unwrap();
        assert!(displayer.settle(Duration::from_secs(10)));

        // the edited chunk and its loaded neighbours across x = 0 and z = 0
        assert_eq!(displayer.context().meshes_installed(), installed + 3);
        let after = displayer.visual_for(ChunkPosition::new(-1, 0, 0)).unwrap();
        assert_ne!(before, after);
        assert!(!backend.scene().placed.contains_key(&before));
    }
}
