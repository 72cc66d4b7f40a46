//! Cube face geometry.
//!
//! A block is drawn as a cube of edge length `scale` centred in its cell. The eight
//! corners are shared by the faces; every face picks four of them in a fixed order
//! together with its normal and UVs, and is split into two triangles with
//! [`TRIANGLE_PATTERN`].

use cgmath::Vector3;

use crate::engine_state::{rendering::Vertex, voxels::block::block_side::BlockSide};

/// Corner offsets in units of the half extent.
///
/// The bottom ring (0..4) runs from (-x, +z) counter-clockwise seen from below, the top
/// ring (4..8) repeats it one unit up.
const CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
];

/// Corners of each face, indexed by [`BlockSide::index`].
const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // down
    [7, 6, 5, 4], // up
    [6, 7, 3, 2], // north
    [4, 5, 1, 0], // south
    [7, 4, 0, 3], // west
    [5, 6, 2, 1], // east
];

/// UVs of the four face vertices, in face corner order.
const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Two counter-clockwise triangles over the four vertices of a face.
pub const TRIANGLE_PATTERN: [usize; 6] = [3, 1, 0, 3, 2, 1];

/// The four vertices of `side` of a cube centred at `center` with half extent `half_extent`.
pub fn face_vertices(side: BlockSide, center: Vector3<f32>, half_extent: f32) -> [Vertex; 4] {
    let normal = side.normal();
    let corners = FACE_CORNERS[side.index()];
    std::array::from_fn(|i| {
        let offset = Vector3::from(CORNERS[corners[i]]) * half_extent;
        Vertex::new(center + offset, normal, FACE_UVS[i])
    })
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn position(vertex: &Vertex) -> Vector3<f32> {
        Vector3::from(vertex.position)
    }

    #[test]
    fn faces_lie_on_their_plane() {
        let center = Vector3::new(0.5, 0.5, 0.5);
        for side in BlockSide::all() {
            let plane = center + side.normal() * 0.5;
            for vertex in face_vertices(side, center, 0.5) {
                let offset = position(&vertex) - plane;
                assert_eq!(offset.dot(side.normal()), 0.0, "{:?}", side);
            }
        }
    }

    #[test]
    fn triangles_wind_towards_the_normal() {
        let center = Vector3::new(0.0, 0.0, 0.0);
        for side in BlockSide::all() {
            let vertices = face_vertices(side, center, 1.0);
            for triangle in TRIANGLE_PATTERN.chunks(3) {
                let a = position(&vertices[triangle[0]]);
                let b = position(&vertices[triangle[1]]);
                let c = position(&vertices[triangle[2]]);
                let winding = (b - a).cross(c - a);
                assert!(winding.dot(side.normal()) > 0.0, "{:?}", side);
            }
        }
    }
}
