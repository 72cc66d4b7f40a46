//! # Block Type Module
//!
//! This module defines the catalog entry describing one kind of voxel: its identity,
//! whether it is drawn at all, the texture stack of each face, its material
//! parameters and its tint hook.

use crate::error::{Result, VoxelError};

use super::{block_side::BlockSide, BlockState, BlockTypeSize, SubmeshTint, TextureResource};

/// An immutable block type definition.
///
/// Visible block types carry exactly six texture stacks, one per face in
/// [`BlockSide`] order (bottom, top, north, south, west, east). Each stack may hold
/// several textures which are drawn as stacked layers. Invisible block types carry no
/// textures and produce no geometry.
///
/// Two block types are equal when their id, name and textures are equal.
#[derive(Clone, Debug)]
pub struct BlockType {
    id: BlockTypeSize,
    name: String,
    invisible: bool,
    textures: Vec<Vec<TextureResource>>,
    metallic: f32,
    roughness: f32,
    reflectance: f32,
    tint: SubmeshTint,
}

impl BlockType {
    /// Creates an invisible block type such as air.
    pub fn invisible(id: BlockTypeSize, name: &str) -> Self {
        BlockType {
            id,
            name: name.to_string(),
            invisible: true,
            textures: Vec::new(),
            metallic: 0.0,
            roughness: 0.0,
            reflectance: 0.0,
            tint: SubmeshTint::None,
        }
    }

    /// Creates a visible block type from its six per-face texture stacks.
    ///
    /// # Errors
    /// Returns [`VoxelError::Registry`] unless exactly six stacks are given.
    pub fn new(
        id: BlockTypeSize,
        name: &str,
        textures: Vec<Vec<TextureResource>>,
        metallic: f32,
        roughness: f32,
        reflectance: f32,
    ) -> Result<Self> {
        if textures.len() != BlockSide::all().len() {
            return Err(VoxelError::Registry(format!(
                "block '{}' needs one texture stack per side, got {}",
                name,
                textures.len()
            )));
        }
        Ok(BlockType {
            id,
            name: name.to_string(),
            invisible: false,
            textures,
            metallic,
            roughness,
            reflectance,
            tint: SubmeshTint::None,
        })
    }

    /// Creates a visible block type using one texture on all six faces.
    pub fn uniform(
        id: BlockTypeSize,
        name: &str,
        texture: TextureResource,
        metallic: f32,
        roughness: f32,
        reflectance: f32,
    ) -> Self {
        BlockType {
            id,
            name: name.to_string(),
            invisible: false,
            textures: vec![vec![texture]; 6],
            metallic,
            roughness,
            reflectance,
            tint: SubmeshTint::None,
        }
    }

    /// Replaces the tint hook of this block type.
    pub fn with_tint(mut self, tint: SubmeshTint) -> Self {
        self.tint = tint;
        self
    }

    /// The unique id of this block type.
    pub fn id(&self) -> BlockTypeSize {
        self.id
    }

    /// The unique name of this block type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether blocks of this type are skipped by the mesher.
    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    /// All texture stacks, empty for invisible types.
    pub fn textures(&self) -> &[Vec<TextureResource>] {
        &self.textures
    }

    /// The texture stack of one face, empty for invisible types.
    pub fn side_textures(&self, side: BlockSide) -> &[TextureResource] {
        self.textures
            .get(side.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Metallic material parameter.
    pub fn metallic(&self) -> f32 {
        self.metallic
    }

    /// Roughness material parameter.
    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    /// Reflectance material parameter.
    pub fn reflectance(&self) -> f32 {
        self.reflectance
    }

    /// The per-face tint hook.
    pub fn tint(&self) -> &SubmeshTint {
        &self.tint
    }

    /// A block state referring to this type.
    pub fn default_state(&self) -> BlockState {
        BlockState::new(self)
    }
}

impl PartialEq for BlockType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.textures == other.textures
    }
}

impl Eq for BlockType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_block_requires_six_texture_stacks() {
        let stacks = vec![vec![TextureResource::opaque("stone")]; 5];
        assert!(matches!(
            BlockType::new(1, "stone", stacks, 0.0, 1.0, 0.0),
            Err(VoxelError::Registry(_))
        ));
    }

    #[test]
    fn invisible_block_has_no_textures() {
        let air = BlockType::invisible(0, "air");
        assert!(air.is_invisible());
        assert!(air.textures().is_empty());
        assert!(air.side_textures(BlockSide::UP).is_empty());
    }

    #[test]
    fn equality_ignores_material_parameters() {
        let a = BlockType::uniform(2, "dirt", TextureResource::opaque("dirt"), 0.0, 1.0, 0.0);
        let b = BlockType::uniform(2, "dirt", TextureResource::opaque("dirt"), 0.5, 0.2, 0.1);
        let c = BlockType::uniform(2, "dirt", TextureResource::opaque("stone"), 0.0, 1.0, 0.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
