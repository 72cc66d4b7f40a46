//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask` which builds the vertices and
//! submeshes of one chunk off the main thread. The main thread only hands the result
//! to the render backend.

use std::sync::Arc;

use log::{debug, error};

use crate::{
    core::MtResource,
    engine_state::{
        pipeline_context::PipelineContext,
        rendering::meshing::{BlockMesher, ChunkMeshBuildResult},
        task_management::task::{Task, TaskResult},
        voxels::{position::ChunkPosition, world::World},
    },
    error::Result,
};

/// A task that generates mesh data for a chunk in a background thread.
///
/// The world read lock is held for the whole build, so neighbour lookups see the
/// same snapshot as the chunk itself.
pub struct ChunkMeshGenerationTask {
    /// Thread-safe reference to the world
    world: MtResource<World>,
    /// Turns blocks into geometry
    mesher: Arc<BlockMesher>,
    /// The chunk to mesh
    position: ChunkPosition,
    /// Request number for this chunk, used to discard results that arrive out of order
    revision: u64,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `world` - Thread-safe reference to the world
    /// * `mesher` - The block mesher
    /// * `position` - The chunk to mesh
    /// * `revision` - Mesh request number handed out by the pipeline context
    pub fn new(
        world: MtResource<World>,
        mesher: Arc<BlockMesher>,
        position: ChunkPosition,
        revision: u64,
    ) -> Self {
        ChunkMeshGenerationTask {
            world,
            mesher,
            position,
            revision,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let world = self.world.get();
        let mesh = world
            .chunk(self.position)
            .map(|chunk| chunk.build_mesh(&world, &self.mesher))
            .transpose();

        Box::new(ChunkMeshGenerationTaskResult {
            position: self.position,
            revision: self.revision,
            mesh,
        })
    }
}

/// The result of a chunk mesh generation task.
///
/// `mesh` is `None` when the chunk was not loaded at the time of the build.
pub struct ChunkMeshGenerationTaskResult {
    position: ChunkPosition,
    revision: u64,
    mesh: Result<Option<ChunkMeshBuildResult>>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Installs the mesh as the chunk's visual.
    ///
    /// Meshing never spawns follow-up tasks.
    fn handle_result(self: Box<Self>, context: &mut PipelineContext) -> Vec<Box<dyn Task + Send>> {
        match self.mesh {
            Ok(Some(mesh)) => context.install_mesh(self.revision, mesh),
            Ok(None) => debug!("Chunk {:?} is not loaded, nothing to mesh", self.position),
            Err(err) => error!("Failed to mesh chunk {:?}: {}", self.position, err),
        }
        Vec::new()
    }
}
