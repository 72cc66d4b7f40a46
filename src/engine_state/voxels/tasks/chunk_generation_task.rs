//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which handles asynchronous
//! generation of chunk data. This task is scheduled when the viewer comes close to
//! a chunk that does not exist yet.

use std::sync::Arc;

use log::{debug, error};

use crate::{
    engine_state::{
        pipeline_context::PipelineContext,
        task_management::task::{Task, TaskResult},
        voxels::{
            block::block_side::BlockSide, chunk::Chunk, generation::WorldGenerator,
            position::ChunkPosition,
        },
    },
    error::Result,
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Creating an empty chunk at the specified position
/// 2. Running the world generator over it
///
/// The chunk only becomes part of the world when the result is handled on the main
/// thread, so workers never write to the world.
pub struct ChunkGenerationTask {
    /// The generator populating the chunk
    generator: Arc<dyn WorldGenerator>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkPosition,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The generator populating the chunk
    /// * `position` - The chunk coordinates where the chunk should be generated
    pub fn new(generator: Arc<dyn WorldGenerator>, position: ChunkPosition) -> Self {
        ChunkGenerationTask { generator, position }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let mut chunk = Chunk::new(self.position);
        let chunk = self.generator.generate(&mut chunk).map(|()| chunk);

        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            chunk,
        })
    }
}

/// The result of a chunk generation task.
///
/// This contains the generated chunk and is responsible for scheduling the
/// follow-up mesh generation.
pub struct ChunkGenerationTaskResult {
    position: ChunkPosition,
    chunk: Result<Chunk>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Inserts the chunk into the world and schedules meshing for it.
    ///
    /// When enabled, face neighbours that are already loaded are re-meshed as well
    /// because the new chunk may hide some of their faces.
    fn handle_result(self: Box<Self>, context: &mut PipelineContext) -> Vec<Box<dyn Task + Send>> {
        let position = self.position;
        context.finish_generation(position);

        let chunk = match self.chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                error!("Failed to generate chunk {:?}: {}", position, err);
                return Vec::new();
            }
        };

        if !context.world.get_mut().insert_chunk(chunk) {
            debug!("Chunk {:?} was already loaded, keeping the existing one", position);
        }

        let mut tasks = vec![context.mesh_task(position)];

        if context.remesh_neighbors_on_insert() {
            let neighbors: Vec<ChunkPosition> = {
                let world = context.world.get();
                BlockSide::all()
                    .into_iter()
                    .map(|side| position.offset(side))
                    .filter(|neighbor| world.has_chunk(*neighbor))
                    .collect()
            };
            tasks.extend(neighbors.into_iter().map(|neighbor| context.mesh_task(neighbor)));
        }

        tasks
    }
}
