//! # Positions
//!
//! Integer coordinates used to address the voxel world: [`BlockPos`] names a single
//! block in world space, [`ChunkPosition`] names a chunk in units of chunks.
//!
//! World block coordinates map to chunk coordinates with floor division, so block
//! `-1` lies in chunk `-1` at local coordinate `15`, not in chunk `0`.

use cgmath::Vector3;

use super::block::block_side::BlockSide;
use super::chunk::CHUNK_DIMENSION;

/// Position of a block in world space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    /// X coordinate in blocks
    pub x: i32,
    /// Y coordinate in blocks
    pub y: i32,
    /// Z coordinate in blocks
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    /// The block containing a point, flooring every component.
    pub fn of_vector(vector: Vector3<f32>) -> Self {
        BlockPos::new(
            vector.x.floor() as i32,
            vector.y.floor() as i32,
            vector.z.floor() as i32,
        )
    }

    /// The neighbouring block across `side`.
    pub fn offset(self, side: BlockSide) -> Self {
        let direction = side.direction();
        BlockPos::new(self.x + direction.x, self.y + direction.y, self.z + direction.z)
    }

    /// The chunk containing this block.
    pub fn chunk_position(self) -> ChunkPosition {
        ChunkPosition::of(self)
    }

    /// The coordinate of this block inside its chunk, every component in `0..16`.
    pub fn local(self) -> (i32, i32, i32) {
        (
            self.x.rem_euclid(CHUNK_DIMENSION),
            self.y.rem_euclid(CHUNK_DIMENSION),
            self.z.rem_euclid(CHUNK_DIMENSION),
        )
    }
}

/// Position of a chunk in units of chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ChunkPosition {
    /// X coordinate in chunks
    pub x: i32,
    /// Y coordinate in chunks
    pub y: i32,
    /// Z coordinate in chunks
    pub z: i32,
}

impl ChunkPosition {
    /// Creates a chunk position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkPosition { x, y, z }
    }

    /// The chunk containing a block.
    pub fn of(block: BlockPos) -> Self {
        ChunkPosition::new(
            block.x.div_euclid(CHUNK_DIMENSION),
            block.y.div_euclid(CHUNK_DIMENSION),
            block.z.div_euclid(CHUNK_DIMENSION),
        )
    }

    /// World coordinate of the chunk's block at local `(0, 0, 0)`.
    pub fn origin(self) -> BlockPos {
        BlockPos::new(
            self.x * CHUNK_DIMENSION,
            self.y * CHUNK_DIMENSION,
            self.z * CHUNK_DIMENSION,
        )
    }

    /// The chunk origin in scene units for blocks of edge length `scale`.
    pub fn as_vector(self, scale: f32) -> Vector3<f32> {
        let origin = self.origin();
        Vector3::new(origin.x as f32, origin.y as f32, origin.z as f32) * scale
    }

    /// The neighbouring chunk across `side`.
    pub fn offset(self, side: BlockSide) -> Self {
        let direction = side.direction();
        ChunkPosition::new(self.x + direction.x, self.y + direction.y, self.z + direction.z)
    }

    /// Every chunk within Chebyshev distance `distance`, this one included.
    ///
    /// Yields `(2 * distance + 1)³` positions ordered by x, then y, then z.
    pub fn iterate_range(self, distance: i32) -> impl Iterator<Item = ChunkPosition> {
        let distance = distance.max(0);
        (-distance..=distance).flat_map(move |dx| {
            (-distance..=distance).flat_map(move |dy| {
                (-distance..=distance)
                    .map(move |dz| ChunkPosition::new(self.x + dx, self.y + dy, self.z + dz))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_floor_into_the_previous_chunk() {
        let block = BlockPos::new(-1, 0, 0);
        assert_eq!(block.chunk_position(), ChunkPosition::new(-1, 0, 0));
        assert_eq!(block.local(), (15, 0, 0));

        let block = BlockPos::new(-16, -17, 16);
        assert_eq!(block.chunk_position(), ChunkPosition::new(-1, -2, 1));
        assert_eq!(block.local(), (0, 15, 0));
    }

    #[test]
    fn of_vector_floors_negative_components() {
        assert_eq!(
            BlockPos::of_vector(Vector3::new(-0.5, 0.99, 2.0)),
            BlockPos::new(-1, 0, 2)
        );
    }

    #[test]
    fn iterate_range_covers_the_full_cube() {
        let center = ChunkPosition::new(3, -2, 0);
        let positions: Vec<_> = center.iterate_range(2).collect();
        assert_eq!(positions.len(), 125);
        assert!(positions.contains(&ChunkPosition::new(5, 0, -2)));
        assert!(positions.contains(&center));
        assert_eq!(center.iterate_range(0).collect::<Vec<_>>(), vec![center]);
    }

    #[test]
    fn origin_scales_with_chunk_size() {
        let position = ChunkPosition::new(1, -1, 2);
        assert_eq!(position.origin(), BlockPos::new(16, -16, 32));
        assert_eq!(position.as_vector(0.5), Vector3::new(8.0, -8.0, 16.0));
    }
}
