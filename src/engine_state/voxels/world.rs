//! # World Module
//!
//! This module provides the `World` struct which manages a collection of chunks in the voxel world.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks that have been generated
//! (or edited) exist. This allows for effectively infinite world sizes while keeping
//! memory proportional to the explored area. Chunks are never removed once inserted.
//!
//! Reading a position whose chunk does not exist reports "no block"; it never
//! creates the chunk. Writing a block is the only operation that creates a missing
//! chunk (filled with air) on demand.
//!
//! ## Change notification
//!
//! Interested parties register a listener with
//! [`World::add_block_change_listener`]. Listeners run synchronously after every
//! successful [`World::set_block`], while the caller still holds the world exclusively,
//! so they must be cheap (typically a channel send).

use std::collections::HashMap;
use std::fmt;

use log::debug;

use super::block::{block_side::BlockSide, registry::BlockRegistry, BlockState};
use super::chunk::Chunk;
use super::position::{BlockPos, ChunkPosition};
use crate::error::Result;

/// Callback run after a block changed, with the block position and its new state.
pub type BlockChangeListener = Box<dyn Fn(BlockPos, BlockState) + Send + Sync>;

/// Represents a voxel world composed of multiple chunks.
///
/// The world is stored as a sparse 3D grid of chunks, where each chunk is a 16x16x16
/// collection of blocks.
///
/// # Examples
///
/// ```
/// use voxel_world::engine_state::voxels::{
///     block::BlockState, chunk::Chunk, position::{BlockPos, ChunkPosition}, world::World,
/// };
///
/// let mut world = World::new();
/// world.insert_chunk(Chunk::new(ChunkPosition::new(0, 0, 0)));
///
/// world.set_block(BlockPos::new(1, 2, 3), BlockState { block_type: 1 }).unwrap();
/// assert_eq!(world.block_at(BlockPos::new(1, 2, 3)), Some(BlockState { block_type: 1 }));
/// assert_eq!(world.block_at(BlockPos::new(100, 0, 0)), None);
/// ```
#[derive(Default)]
pub struct World {
    /// A mapping from chunk coordinates to chunk data.
    chunks: HashMap<ChunkPosition, Chunk>,
    listeners: Vec<BlockChangeListener>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a chunk exists at `position`.
    pub fn has_chunk(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    /// The chunk at `position`, if it exists.
    pub fn chunk(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Number of chunks in the world.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Positions of all chunks, in no particular order.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPosition> + '_ {
        self.chunks.keys().copied()
    }

    /// Adds a chunk at its own position.
    ///
    /// A chunk that is already present is kept and `chunk` is discarded; returns
    /// whether `chunk` was inserted.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> bool {
        if self.chunks.contains_key(&chunk.position) {
            debug!("Chunk {:?} already present, keeping it", chunk.position);
            return false;
        }
        self.chunks.insert(chunk.position, chunk);
        true
    }

    /// The block at a world position, or `None` if its chunk does not exist.
    pub fn block_at(&self, pos: BlockPos) -> Option<BlockState> {
        self.chunks
            .get(&pos.chunk_position())
            .and_then(|chunk| chunk.get_world(pos).ok())
    }

    /// Sets the block at a world position and notifies the listeners.
    ///
    /// A missing chunk is created filled with air first.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Result<()> {
        let position = pos.chunk_position();
        self.chunks
            .entry(position)
            .or_insert_with(|| {
                debug!("Creating chunk {:?} for a block edit", position);
                Chunk::new(position)
            })
            .set_world(pos, state)?;

        for listener in &self.listeners {
            listener(pos, state);
        }
        Ok(())
    }

    /// Registers a callback run after every successful [`World::set_block`].
    pub fn add_block_change_listener(&mut self, listener: BlockChangeListener) {
        self.listeners.push(listener);
    }

    /// Whether the face `side` of the block at `pos` can be seen, i.e. the
    /// neighbouring block exists and is invisible. A neighbour in a missing chunk
    /// hides the face.
    pub fn is_face_exposed(&self, pos: BlockPos, side: BlockSide, registry: &BlockRegistry) -> bool {
        self.block_at(pos.offset(side))
            .and_then(|state| registry.state_type(state).ok())
            .is_some_and(|block| block.is_invisible())
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("chunks", &self.chunks.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
