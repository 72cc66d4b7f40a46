//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the unit direction
//! each of them points in.

use cgmath::Vector3;
use num_derive::FromPrimitive;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned its face index. The order is fixed: texture stacks of a
/// block type, material layers and submesh processing all use it.
///
/// The order is: [DOWN, UP, NORTH, SOUTH, WEST, EAST]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// The bottom face (facing negative Y)
    DOWN = 0,

    /// The top face (facing positive Y)
    UP = 1,

    /// The north face (facing negative Z)
    NORTH = 2,

    /// The south face (facing positive Z)
    SOUTH = 3,

    /// The west face (facing negative X)
    WEST = 4,

    /// The east face (facing positive X)
    EAST = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in index order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::DOWN,
            BlockSide::UP,
            BlockSide::NORTH,
            BlockSide::SOUTH,
            BlockSide::WEST,
            BlockSide::EAST,
        ]
    }

    /// Looks a face up by its index, `None` for anything outside `0..6`.
    pub fn from_index(index: usize) -> Option<Self> {
        num_traits::FromPrimitive::from_usize(index)
    }

    /// The index of this face, matching the texture stack order of block types.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit vector from a block towards the neighbour sharing this face.
    pub fn direction(self) -> Vector3<i32> {
        match self {
            BlockSide::DOWN => Vector3::new(0, -1, 0),
            BlockSide::UP => Vector3::new(0, 1, 0),
            BlockSide::NORTH => Vector3::new(0, 0, -1),
            BlockSide::SOUTH => Vector3::new(0, 0, 1),
            BlockSide::WEST => Vector3::new(-1, 0, 0),
            BlockSide::EAST => Vector3::new(1, 0, 0),
        }
    }

    /// The outward face normal as a float vector.
    pub fn normal(self) -> Vector3<f32> {
        let direction = self.direction();
        Vector3::new(direction.x as f32, direction.y as f32, direction.z as f32)
    }

    /// The face on the opposite side of the block.
    pub fn opposite(self) -> Self {
        match self {
            BlockSide::DOWN => BlockSide::UP,
            BlockSide::UP => BlockSide::DOWN,
            BlockSide::NORTH => BlockSide::SOUTH,
            BlockSide::SOUTH => BlockSide::NORTH,
            BlockSide::WEST => BlockSide::EAST,
            BlockSide::EAST => BlockSide::WEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BlockSide;

    #[test]
    fn index_round_trips_through_from_index() {
        for side in BlockSide::all() {
            assert_eq!(BlockSide::from_index(side.index()), Some(side));
        }
        assert_eq!(BlockSide::from_index(6), None);
    }

    #[test]
    fn opposite_faces_point_in_opposite_directions() {
        for side in BlockSide::all() {
            assert_eq!(side.direction() + side.opposite().direction(), cgmath::Vector3::new(0, 0, 0));
        }
    }
}
