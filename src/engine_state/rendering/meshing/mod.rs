//! Chunk meshing.
//!
//! Turns the blocks of a chunk into renderable geometry. Every visible block is drawn
//! as a cube; a face is only emitted when the neighbouring cell is air (or another
//! invisible block). Faces are grouped into one submesh per face and texture layer so
//! that stacked overlay textures (like the grass side overlay) are drawn as separate
//! passes over the same vertices.
//!
//! Neighbours in chunks that have not been generated yet count as solid, so chunk
//! borders facing unknown terrain stay closed until the neighbour arrives and both
//! chunks are re-meshed.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Vector3;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, registry::BlockRegistry, BlockState},
    chunk::Chunk,
    position::ChunkPosition,
    world::World,
};
use crate::error::Result;

use super::{material::MaterialLibrary, SubmeshMaterial, Vertex};

pub mod face;

/// Triangles sharing one material.
#[derive(Clone, Debug, PartialEq)]
pub struct Submesh {
    /// Triangle list indexing the chunk's vertex buffer
    pub indices: Vec<u32>,
    /// Material the triangles are drawn with
    pub material: SubmeshMaterial,
}

/// Geometry of one chunk, ready to be handed to the render backend.
#[derive(Clone, Debug)]
pub struct ChunkMeshBuildResult {
    /// The chunk the geometry belongs to
    pub position: ChunkPosition,
    /// Deduplicated vertices, positioned relative to the chunk origin
    pub vertices: Vec<Vertex>,
    /// Submeshes indexing `vertices`
    pub submeshes: Vec<Submesh>,
}

impl ChunkMeshBuildResult {
    /// Whether the chunk has no visible face at all.
    pub fn is_empty(&self) -> bool {
        self.submeshes.is_empty() || self.vertices.is_empty()
    }
}

/// Accumulates the geometry of one chunk build.
///
/// Vertices with exactly the same attributes are stored once.
#[derive(Debug, Default)]
pub struct ChunkMeshBuilder {
    vertices: Vec<Vertex>,
    lookup: HashMap<[u32; 8], u32>,
    submeshes: Vec<Submesh>,
}

impl ChunkMeshBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `vertex` in the vertex buffer, appending it if it is new.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let vertices = &mut self.vertices;
        *self.lookup.entry(vertex.key()).or_insert_with(|| {
            vertices.push(vertex);
            (vertices.len() - 1) as u32
        })
    }

    /// Appends a finished submesh.
    pub fn push_submesh(&mut self, submesh: Submesh) {
        self.submeshes.push(submesh);
    }

    /// Number of distinct vertices so far.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Finishes the build for the chunk at `position`.
    pub fn finish(self, position: ChunkPosition) -> ChunkMeshBuildResult {
        ChunkMeshBuildResult {
            position,
            vertices: self.vertices,
            submeshes: self.submeshes,
        }
    }
}

/// Emits cube geometry for single blocks.
///
/// Shared by all meshing workers; it only holds read-only data.
#[derive(Debug)]
pub struct BlockMesher {
    registry: Arc<BlockRegistry>,
    materials: Arc<MaterialLibrary>,
    scale: f32,
}

impl BlockMesher {
    /// Creates a mesher drawing blocks with edge length `scale`.
    pub fn new(registry: Arc<BlockRegistry>, materials: Arc<MaterialLibrary>, scale: f32) -> Self {
        BlockMesher {
            registry,
            materials,
            scale,
        }
    }

    /// The registry block states are looked up in.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Edge length of one block in scene units.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the neighbour of local cell `(x, y, z)` across `side` lets that face be seen.
    ///
    /// Neighbours inside `chunk` are read from it directly; the others are decided by
    /// [`World::is_face_exposed`].
    pub fn is_face_exposed(
        &self,
        chunk: &Chunk,
        world: &World,
        (x, y, z): (i32, i32, i32),
        side: BlockSide,
    ) -> bool {
        let direction = side.direction();
        let (nx, ny, nz) = (x + direction.x, y + direction.y, z + direction.z);
        if !Chunk::contains_local(nx, ny, nz) {
            return world.is_face_exposed(chunk.to_world(x, y, z), side, &self.registry);
        }
        chunk
            .get_local(nx, ny, nz)
            .is_ok_and(|state| self.is_invisible(state))
    }

    fn is_invisible(&self, state: BlockState) -> bool {
        self.registry
            .state_type(state)
            .map(|block| block.is_invisible())
            .unwrap_or(false)
    }

    /// Emits the exposed faces of the block at local `(x, y, z)` of `chunk`.
    ///
    /// # Errors
    /// Fails if the block id is unknown or a face material is not resolved yet.
    pub fn emit_block(
        &self,
        chunk: &Chunk,
        world: &World,
        (x, y, z): (i32, i32, i32),
        builder: &mut ChunkMeshBuilder,
    ) -> Result<()> {
        let block = self.registry.state_type(chunk.get_local(x, y, z)?)?;
        if block.is_invisible() {
            return Ok(());
        }

        let half_extent = 0.5 * self.scale;
        let center = Vector3::new(x as f32, y as f32, z as f32) * self.scale
            + Vector3::new(half_extent, half_extent, half_extent);

        for side in BlockSide::all() {
            if !self.is_face_exposed(chunk, world, (x, y, z), side) {
                continue;
            }

            let corners = face::face_vertices(side, center, half_extent)
                .map(|vertex| builder.push_vertex(vertex));
            let indices: Vec<u32> = face::TRIANGLE_PATTERN.iter().map(|&i| corners[i]).collect();

            for layer in 0..block.side_textures(side).len() {
                let mut material = self.materials.material(block, side, layer)?;
                block.tint().apply(x, y, z, side, layer, &mut material);
                builder.push_submesh(Submesh {
                    indices: indices.clone(),
                    material,
                });
            }
        }

        Ok(())
    }
}
