//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a 16x16x16 block of voxel data and the
//! unit of generation and meshing.
//!
//! ## Storage
//!
//! Chunks store one [`BlockState`] per cell in a dense array. A cell at local
//! coordinate `(x, y, z)` lives at index `x * 16² + y * 16 + z`. Block states are a
//! single byte, so a chunk costs 4 KiB regardless of its content, and every lookup is
//! O(1).
//!
//! Local coordinates outside `0..16` are rejected with
//! [`VoxelError::OutOfBounds`]; they are never clamped or wrapped.

use std::hash::{Hash, Hasher};

use log::debug;
use web_time::Instant;

use crate::engine_state::rendering::meshing::{BlockMesher, ChunkMeshBuildResult, ChunkMeshBuilder};
use crate::error::{Result, VoxelError};

use super::block::BlockState;
use super::position::{BlockPos, ChunkPosition};
use super::world::World;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: usize = (CHUNK_DIMENSION * CHUNK_DIMENSION) as usize;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: usize = CHUNK_PLANE_SIZE * CHUNK_DIMENSION as usize;

/// Represents a 16x16x16 collection of voxel blocks in the world.
///
/// Two chunks are equal when their blocks are equal; the position is not compared.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkPosition,
    blocks: Vec<BlockState>,
}

impl Chunk {
    /// Creates a chunk filled with air.
    pub fn new(position: ChunkPosition) -> Self {
        Chunk {
            position,
            blocks: vec![BlockState::AIR; CHUNK_SIZE],
        }
    }

    /// Whether a local coordinate lies inside a chunk.
    pub fn contains_local(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_DIMENSION).contains(&x)
            && (0..CHUNK_DIMENSION).contains(&y)
            && (0..CHUNK_DIMENSION).contains(&z)
    }

    fn index(x: i32, y: i32, z: i32) -> Result<usize> {
        if !Self::contains_local(x, y, z) {
            return Err(VoxelError::OutOfBounds {
                x,
                y,
                z,
                extent: "chunk",
            });
        }
        Ok(x as usize * CHUNK_PLANE_SIZE + y as usize * CHUNK_DIMENSION as usize + z as usize)
    }

    /// Reads the block at a local coordinate.
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Result<BlockState> {
        Ok(self.blocks[Self::index(x, y, z)?])
    }

    /// Writes the block at a local coordinate.
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> Result<()> {
        let index = Self::index(x, y, z)?;
        self.blocks[index] = state;
        Ok(())
    }

    /// The world position of a local coordinate of this chunk.
    pub fn to_world(&self, x: i32, y: i32, z: i32) -> BlockPos {
        let origin = self.position.origin();
        BlockPos::new(origin.x + x, origin.y + y, origin.z + z)
    }

    fn to_local(&self, pos: BlockPos) -> (i32, i32, i32) {
        let origin = self.position.origin();
        (pos.x - origin.x, pos.y - origin.y, pos.z - origin.z)
    }

    /// Reads the block at a world position, which must lie inside this chunk.
    pub fn get_world(&self, pos: BlockPos) -> Result<BlockState> {
        let (x, y, z) = self.to_local(pos);
        self.get_local(x, y, z)
    }

    /// Writes the block at a world position, which must lie inside this chunk.
    pub fn set_world(&mut self, pos: BlockPos, state: BlockState) -> Result<()> {
        let (x, y, z) = self.to_local(pos);
        self.set_local(x, y, z, state)
    }

    /// Sets every cell to `state`.
    pub fn fill(&mut self, state: BlockState) {
        self.blocks.fill(state);
    }

    /// Iterates all cells as `((x, y, z), state)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32, i32), BlockState)> + '_ {
        self.blocks.iter().enumerate().map(|(index, state)| {
            let x = index / CHUNK_PLANE_SIZE;
            let y = (index / CHUNK_DIMENSION as usize) % CHUNK_DIMENSION as usize;
            let z = index % CHUNK_DIMENSION as usize;
            ((x as i32, y as i32, z as i32), *state)
        })
    }

    /// Whether every cell is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(BlockState::is_air)
    }

    /// Builds the geometry of this chunk.
    ///
    /// Only visible blocks are passed to the mesher; faces towards blocks of other
    /// chunks are resolved through `world`.
    pub fn build_mesh(&self, world: &World, mesher: &BlockMesher) -> Result<ChunkMeshBuildResult> {
        let start = Instant::now();
        let mut builder = ChunkMeshBuilder::new();

        for (local, state) in self.iter() {
            if state.is_air() {
                continue;
            }
            mesher.emit_block(self, world, local, &mut builder)?;
        }

        let result = builder.finish(self.position);
        debug!(
            "Meshed chunk {:?}: {} vertices, {} submeshes in {:?}",
            self.position,
            result.vertices.len(),
            result.submeshes.len(),
            start.elapsed()
        );
        Ok(result)
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Eq for Chunk {}

impl Hash for Chunk {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.blocks.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use crate::testing;

    #[test]
    fn set_then_get_round_trips_every_cell() {
        let registry = testing::registry();
        let stone = registry.by_name("stone").unwrap().default_state();
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));

        for x in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                for z in 0..CHUNK_DIMENSION {
                    assert_eq!(chunk.get_local(x, y, z).unwrap(), BlockState::AIR);
                    chunk.set_local(x, y, z, stone).unwrap();
                    assert_eq!(chunk.get_local(x, y, z).unwrap(), stone);
                }
            }
        }
        assert!(chunk.iter().all(|(_, state)| state == stone));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        for (x, y, z) in [(-1, 0, 0), (16, 0, 0), (0, -1, 0), (0, 16, 0), (0, 0, -1), (0, 0, 16)] {
            assert!(matches!(
                chunk.get_local(x, y, z),
                Err(VoxelError::OutOfBounds { extent: "chunk", .. })
            ));
            assert!(chunk.set_local(x, y, z, BlockState { block_type: 1 }).is_err());
        }
        assert!(chunk.is_empty());
    }

    #[test]
    fn world_coordinates_use_the_chunk_origin() {
        let mut chunk = Chunk::new(ChunkPosition::new(-1, 0, 0));
        let dirt = BlockState { block_type: 2 };
        chunk.set_world(BlockPos::new(-1, 0, 0), dirt).unwrap();
        assert_eq!(chunk.get_local(15, 0, 0).unwrap(), dirt);
        assert_eq!(chunk.get_world(BlockPos::new(-1, 0, 0)).unwrap(), dirt);
        assert!(chunk.get_world(BlockPos::new(0, 0, 0)).is_err());
    }

    #[test]
    fn iteration_matches_storage_index() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        chunk.set_local(3, 5, 7, BlockState { block_type: 1 }).unwrap();
        let filled: Vec<_> = chunk.iter().filter(|(_, state)| !state.is_air()).collect();
        assert_eq!(filled, vec![((3, 5, 7), BlockState { block_type: 1 })]);
    }

    #[test]
    fn equality_ignores_position() {
        let mut a = Chunk::new(ChunkPosition::new(0, 0, 0));
        let mut b = Chunk::new(ChunkPosition::new(4, 0, 0));
        assert_eq!(a, b);
        a.set_local(0, 0, 0, BlockState { block_type: 1 }).unwrap();
        assert_ne!(a, b);
        b.set_local(0, 0, 0, BlockState { block_type: 1 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_block_shows_all_six_faces() {
        let registry = testing::registry();
        let mesher = testing::mesher(&registry);
        let stone = registry.by_name("stone").unwrap().default_state();
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        chunk.set_local(8, 8, 8, stone).unwrap();

        let result = chunk.build_mesh(&World::new(), &mesher).unwrap();
        assert_eq!(result.submeshes.len(), 6);
        assert_eq!(result.vertices.len(), 24);
        assert!(result.submeshes.iter().all(|submesh| submesh.indices.len() == 6));
    }

    #[test]
    fn solid_chunk_without_neighbours_has_no_faces() {
        let registry = testing::registry();
        let mesher = testing::mesher(&registry);
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        chunk.fill(registry.by_name("stone").unwrap().default_state());

        let result = chunk.build_mesh(&World::new(), &mesher).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn border_faces_open_towards_an_air_neighbour() {
        let registry = testing::registry();
        let mesher = testing::mesher(&registry);
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        chunk.fill(registry.by_name("stone").unwrap().default_state());

        let mut world = World::new();
        world.insert_chunk(Chunk::new(ChunkPosition::new(0, 1, 0)));

        let result = chunk.build_mesh(&world, &mesher).unwrap();
        assert_eq!(result.submeshes.len(), CHUNK_PLANE_SIZE);
        let up = BlockSide::UP.normal();
        for submesh in &result.submeshes {
            for &index in &submesh.indices {
                assert_eq!(result.vertices[index as usize].normal, Into::<[f32; 3]>::into(up));
            }
        }
    }

    #[test]
    fn grass_emits_tinted_layers() {
        let registry = testing::registry();
        let mesher = testing::mesher(&registry);
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0, 0));
        chunk
            .set_local(1, 1, 1, registry.by_name("grass").unwrap().default_state())
            .unwrap();

        let result = chunk.build_mesh(&World::new(), &mesher).unwrap();
        // bottom and top carry one layer, the four sides two
        assert_eq!(result.submeshes.len(), 10);
        let tinted = result
            .submeshes
            .iter()
            .filter(|submesh| submesh.material.color != crate::engine_state::rendering::material::WHITE)
            .count();
        assert_eq!(tinted, 5);
    }
}
