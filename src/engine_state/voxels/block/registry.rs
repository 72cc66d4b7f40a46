//! # Block Registry
//!
//! The catalog of every block type. It is built once at startup, validated, and then
//! shared read-only (behind an `Arc`) with everything that needs block lookups:
//! the world, the mesher, the structure parser and the generators.

use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::error::{Result, VoxelError};

use super::{
    block_type::BlockType, colormap::Colormap, BlockState, BlockTypeSize, SubmeshTint,
    TextureResource,
};

/// Name of the block every chunk is filled with.
pub const AIR: &str = "air";

/// Climate at which grass samples its colormap.
const GRASS_TEMPERATURE: f32 = 0.65;
const GRASS_HUMIDITY: f32 = 0.80;

/// Colour applied to leaves (0x48B518).
const LEAVES_COLOR: [f32; 4] = [72.0 / 255.0, 181.0 / 255.0, 24.0 / 255.0, 1.0];

/// An immutable, validated set of block types.
///
/// Block ids are dense: the block with id `n` is stored at index `n`, and id 0 is the
/// invisible air block.
#[derive(Debug)]
pub struct BlockRegistry {
    blocks: Vec<BlockType>,
    by_name: HashMap<String, BlockTypeSize>,
}

impl BlockRegistry {
    /// Builds a registry from a list of block types ordered by id.
    ///
    /// # Errors
    /// Returns [`VoxelError::Registry`] when ids are not dense and ordered, a name is
    /// used twice, or id 0 is not an invisible block named `air`.
    pub fn new(blocks: Vec<BlockType>) -> Result<Self> {
        match blocks.first() {
            Some(air) if air.name() == AIR && air.is_invisible() => {}
            _ => {
                return Err(VoxelError::Registry(
                    "the first registered block must be the invisible 'air' block".to_string(),
                ))
            }
        }

        let mut by_name = HashMap::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            if block.id() as usize != index {
                return Err(VoxelError::Registry(format!(
                    "block '{}' has id {} but was registered at position {}",
                    block.name(),
                    block.id(),
                    index
                )));
            }
            if by_name.insert(block.name().to_string(), block.id()).is_some() {
                return Err(VoxelError::Registry(format!(
                    "block name '{}' registered twice",
                    block.name()
                )));
            }
        }

        debug!("Registered {} block types", blocks.len());
        Ok(BlockRegistry { blocks, by_name })
    }

    /// Builds the fixed catalog of the game.
    ///
    /// `grass_colormap` is sampled to tint grass tops and grass side overlays.
    pub fn register_all(grass_colormap: Arc<Colormap>) -> Result<Self> {
        let grass_side = vec![
            TextureResource::opaque("dirt"),
            TextureResource::transparent("grass_block_side_overlay"),
        ];
        let grass = BlockType::new(
            4,
            "grass",
            vec![
                vec![TextureResource::opaque("dirt")],
                vec![TextureResource::opaque("grass_block_top")],
                grass_side.clone(),
                grass_side.clone(),
                grass_side.clone(),
                grass_side,
            ],
            0.0,
            1.0,
            0.0,
        )?
        .with_tint(SubmeshTint::GrassColormap {
            colormap: grass_colormap,
            temperature: GRASS_TEMPERATURE,
            humidity: GRASS_HUMIDITY,
        });

        let log_top = vec![TextureResource::opaque("spruce_log_top")];
        let log_side = vec![TextureResource::opaque("spruce_log")];
        let log = BlockType::new(
            5,
            "log",
            vec![
                log_top.clone(),
                log_top,
                log_side.clone(),
                log_side.clone(),
                log_side.clone(),
                log_side,
            ],
            0.0,
            1.0,
            0.0,
        )?;

        Self::new(vec![
            BlockType::invisible(0, AIR),
            BlockType::uniform(1, "stone", TextureResource::opaque("stone"), 0.0, 1.0, 0.0),
            BlockType::uniform(2, "dirt", TextureResource::opaque("dirt"), 0.0, 1.0, 0.0),
            BlockType::uniform(3, "bedrock", TextureResource::opaque("bedrock"), 0.25, 1.0, 0.15),
            grass,
            log,
            BlockType::uniform(6, "leaves", TextureResource::opaque("spruce_leaves"), 0.0, 1.0, 0.0)
                .with_tint(SubmeshTint::Uniform(LEAVES_COLOR)),
            BlockType::uniform(7, "diamond_ore", TextureResource::opaque("diamond_ore"), 0.0, 1.0, 0.0),
        ])
    }

    /// Looks a block type up by id.
    pub fn by_id(&self, id: BlockTypeSize) -> Result<&BlockType> {
        self.blocks
            .get(id as usize)
            .ok_or_else(|| VoxelError::Registry(format!("unknown block id {}", id)))
    }

    /// Looks a block type up by name.
    pub fn by_name(&self, name: &str) -> Result<&BlockType> {
        let id = self
            .by_name
            .get(name)
            .ok_or_else(|| VoxelError::Registry(format!("unknown block '{}'", name)))?;
        self.by_id(*id)
    }

    /// The block type a state refers to.
    pub fn state_type(&self, state: BlockState) -> Result<&BlockType> {
        self.by_id(state.block_type)
    }

    /// Every block type in id order.
    pub fn all(&self) -> &[BlockType] {
        &self.blocks
    }

    /// The air block.
    pub fn air(&self) -> &BlockType {
        &self.blocks[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BlockRegistry {
        BlockRegistry::register_all(Arc::new(Colormap::default_grass())).unwrap()
    }

    #[test]
    fn catalog_is_ordered_by_id() {
        let registry = registry();
        let names: Vec<&str> = registry.all().iter().map(BlockType::name).collect();
        assert_eq!(
            names,
            ["air", "stone", "dirt", "bedrock", "grass", "log", "leaves", "diamond_ore"]
        );
        assert!(registry.air().is_invisible());
        assert_eq!(registry.by_name("log").unwrap().id(), 5);
        assert_eq!(registry.by_id(6).unwrap().name(), "leaves");
    }

    #[test]
    fn missing_lookups_are_errors() {
        let registry = registry();
        assert!(matches!(registry.by_name("glass"), Err(VoxelError::Registry(_))));
        assert!(matches!(registry.by_id(200), Err(VoxelError::Registry(_))));
    }

    #[test]
    fn grass_sides_stack_an_overlay() {
        let registry = registry();
        let grass = registry.by_name("grass").unwrap();
        assert_eq!(grass.textures().len(), 6);
        assert_eq!(grass.side_textures(super::super::block_side::BlockSide::NORTH).len(), 2);
    }

    #[test]
    fn rejects_duplicate_names_and_gaps() {
        let duplicate = BlockRegistry::new(vec![
            BlockType::invisible(0, AIR),
            BlockType::uniform(1, "stone", TextureResource::opaque("stone"), 0.0, 1.0, 0.0),
            BlockType::uniform(2, "stone", TextureResource::opaque("stone"), 0.0, 1.0, 0.0),
        ]);
        assert!(duplicate.is_err());

        let gap = BlockRegistry::new(vec![
            BlockType::invisible(0, AIR),
            BlockType::uniform(3, "stone", TextureResource::opaque("stone"), 0.0, 1.0, 0.0),
        ]);
        assert!(gap.is_err());

        let no_air = BlockRegistry::new(vec![BlockType::uniform(
            0,
            "stone",
            TextureResource::opaque("stone"),
            0.0,
            1.0,
            0.0,
        )]);
        assert!(no_air.is_err());
    }
}
