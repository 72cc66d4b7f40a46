//! # Structures
//!
//! Prefabricated block patterns, such as trees, that generators stamp into chunks.
//! Structures are written in a small layered text format (see [`parser`]), parsed
//! once and then shared immutably.
//!
//! Cells are stored densely at index `x * sizeZ + y * sizeZ * sizeX + z`. Air cells
//! are transparent on placement: they never overwrite what is already in the chunk.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use log::debug;

use crate::engine_state::voxels::block::{registry::BlockRegistry, BlockState};
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DIMENSION};
use crate::error::{Result, VoxelError};

pub mod parser;

/// Source of the bundled tree structure.
const TREE_SOURCE: &str = include_str!("../../../../assets/structures/tree.struct");

/// Characters tried, in order, when a block name's first letter is already taken
/// while serializing.
const FALLBACK_SYNONYMS: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// A parsed, immutable block pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    name: Option<String>,
    size_x: usize,
    size_y: usize,
    size_z: usize,
    blocks: Vec<BlockState>,
}

impl Structure {
    /// Creates a structure from its cells in storage order.
    ///
    /// # Errors
    /// [`VoxelError::Format`] if a size is zero or `blocks` does not hold exactly
    /// `sizeX * sizeY * sizeZ` cells.
    pub fn new(
        name: Option<String>,
        (size_x, size_y, size_z): (usize, usize, usize),
        blocks: Vec<BlockState>,
    ) -> Result<Self> {
        if size_x == 0 || size_y == 0 || size_z == 0 {
            return Err(VoxelError::format(0, "structure sizes must be positive"));
        }
        if blocks.len() != size_x * size_y * size_z {
            return Err(VoxelError::format(
                0,
                format!(
                    "structure of size {}x{}x{} needs {} cells, got {}",
                    size_x,
                    size_y,
                    size_z,
                    size_x * size_y * size_z,
                    blocks.len()
                ),
            ));
        }
        Ok(Structure {
            name,
            size_x,
            size_y,
            size_z,
            blocks,
        })
    }

    /// Parses structure text.
    pub fn parse(text: &str, registry: &BlockRegistry) -> Result<Self> {
        parser::parse(text, registry)
    }

    /// Loads and parses a UTF-8 structure file.
    pub fn from_resource(path: impl AsRef<Path>, registry: &BlockRegistry) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VoxelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let structure = Self::parse(&text, registry)?;
        debug!("Loaded structure {:?} from {:?}", structure.name, path);
        Ok(structure)
    }

    /// The bundled spruce tree.
    pub fn tree(registry: &BlockRegistry) -> Result<Self> {
        Self::parse(TREE_SOURCE, registry)
    }

    /// The name declared in the `.info` section, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Extent as `(sizeX, sizeY, sizeZ)`.
    pub fn size(&self) -> (usize, usize, usize) {
        (self.size_x, self.size_y, self.size_z)
    }

    pub(crate) fn index_of(size_x: usize, size_z: usize, x: usize, y: usize, z: usize) -> usize {
        x * size_z + y * size_z * size_x + z
    }

    /// The cell at `(x, y, z)` of the pattern.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<BlockState> {
        let inside = |value: i32, size: usize| value >= 0 && (value as usize) < size;
        if !(inside(x, self.size_x) && inside(y, self.size_y) && inside(z, self.size_z)) {
            return Err(VoxelError::OutOfBounds {
                x,
                y,
                z,
                extent: "structure",
            });
        }
        Ok(self.blocks[Self::index_of(self.size_x, self.size_z, x as usize, y as usize, z as usize)])
    }

    /// Whether the whole bounding box fits into a chunk when placed at `(x, y, z)`.
    pub fn fits_at(&self, x: i32, y: i32, z: i32) -> bool {
        let fits = |start: i32, size: usize| start >= 0 && start as i64 + size as i64 <= CHUNK_DIMENSION as i64;
        fits(x, self.size_x) && fits(y, self.size_y) && fits(z, self.size_z)
    }

    /// Copies every non-air cell into `chunk` with the pattern origin at local `(x, y, z)`.
    ///
    /// # Errors
    /// [`VoxelError::OutOfBounds`] if the bounding box leaves the chunk; the chunk
    /// is left untouched in that case.
    pub fn place_into(&self, chunk: &mut Chunk, x: i32, y: i32, z: i32) -> Result<()> {
        if !self.fits_at(x, y, z) {
            return Err(VoxelError::OutOfBounds {
                x,
                y,
                z,
                extent: "chunk",
            });
        }

        for dx in 0..self.size_x {
            for dy in 0..self.size_y {
                for dz in 0..self.size_z {
                    let state = self.blocks[Self::index_of(self.size_x, self.size_z, dx, dy, dz)];
                    if !state.is_air() {
                        chunk.set_local(x + dx as i32, y + dy as i32, z + dz as i32, state)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Serializes the structure back into the text format.
    ///
    /// Block synonyms are picked from block names and may differ from the ones in
    /// the text the structure was parsed from.
    pub fn to_text(&self, registry: &BlockRegistry) -> Result<String> {
        let mut synonyms: HashMap<BlockState, char> = HashMap::new();
        let mut declarations = Vec::new();
        for state in self.blocks.iter().filter(|state| !state.is_air()) {
            if synonyms.contains_key(state) {
                continue;
            }
            let block = registry.state_type(*state)?;
            let taken: Vec<char> = synonyms.values().copied().collect();
            let synonym = block
                .name()
                .chars()
                .take(1)
                .chain(FALLBACK_SYNONYMS.chars())
                .find(|c| {
                    *c != parser::AIR_SYNONYM && *c != parser::CELL_SEPARATOR && !taken.contains(c)
                })
                .ok_or_else(|| VoxelError::Registry("ran out of block synonyms".to_string()))?;
            synonyms.insert(*state, synonym);
            declarations.push((synonym, block.name().to_string()));
        }

        let mut text = String::from(".info\n");
        if let Some(name) = &self.name {
            let _ = writeln!(text, "$name={}", name);
        }
        let _ = writeln!(text, "$sizeX={}", self.size_x);
        let _ = writeln!(text, "$sizeY={}", self.size_y);
        let _ = writeln!(text, "$sizeZ={}", self.size_z);

        text.push_str(".blocks\n");
        for (synonym, name) in declarations {
            let _ = writeln!(text, "${}={}", synonym, name);
        }

        for y in 0..self.size_y {
            let _ = writeln!(text, ".layer {}", y);
            for z in 0..self.size_z {
                text.push(parser::CELL_SEPARATOR);
                for x in 0..self.size_x {
                    let state = self.blocks[Self::index_of(self.size_x, self.size_z, x, y, z)];
                    text.push(synonyms.get(&state).copied().unwrap_or(parser::AIR_SYNONYM));
                    text.push(parser::CELL_SEPARATOR);
                }
                text.push('\n');
            }
        }
        Ok(text)
    }
}
