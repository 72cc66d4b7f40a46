//! Parser for the layered structure text format.
//!
//! ```text
//! .info
//! $name=spruce_tree
//! $sizeX=5
//! $sizeY=6
//! $sizeZ=5
//! .blocks
//! $l=log
//! .layer 0
//! | | | | | |
//! | | |l| | |
//! ```
//!
//! Lines starting with `.` open a section, lines starting with `$` assign a variable
//! of the current section and lines starting with `|` add a row of cells to the
//! current layer. Every cell is a single character: a space is air, anything else
//! must be declared in the `.blocks` section first. A layer holds `sizeZ` rows of
//! `sizeX` cells. Blank lines are ignored and any other line is an error.

use std::collections::HashMap;

use crate::engine_state::voxels::block::{registry::BlockRegistry, BlockState};
use crate::error::{Result, VoxelError};

use super::Structure;

/// Character reserved for air cells.
pub const AIR_SYNONYM: char = ' ';
/// Separator between cells of a row.
pub const CELL_SEPARATOR: char = '|';

#[derive(Clone, Copy, Debug, PartialEq)]
enum Section {
    None,
    Info,
    Blocks,
    Layer(usize),
}

struct StructureParser<'a> {
    registry: &'a BlockRegistry,
    section: Section,
    name: Option<String>,
    size_x: Option<usize>,
    size_y: Option<usize>,
    size_z: Option<usize>,
    synonyms: HashMap<char, BlockState>,
    /// Rows per layer, allocated once all three sizes are known.
    layers: Option<Vec<Vec<Vec<BlockState>>>>,
}

/// Parses structure text, resolving block names through `registry`.
///
/// # Errors
/// [`VoxelError::Format`] for malformed text (with the offending line number) and
/// [`VoxelError::Registry`] for block names that are not registered.
pub fn parse(text: &str, registry: &BlockRegistry) -> Result<Structure> {
    let mut parser = StructureParser {
        registry,
        section: Section::None,
        name: None,
        size_x: None,
        size_y: None,
        size_z: None,
        synonyms: HashMap::new(),
        layers: None,
    };

    for (index, line) in text.lines().enumerate() {
        parser.parse_line(index + 1, line.trim_end_matches('\r'))?;
    }
    parser.finish()
}

impl StructureParser<'_> {
    fn parse_line(&mut self, line_number: usize, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        if let Some(header) = line.strip_prefix('.') {
            self.section = Self::parse_section(line_number, header)?;
            Ok(())
        } else if let Some(declaration) = line.strip_prefix('$') {
            self.parse_variable(line_number, declaration)
        } else if line.starts_with(CELL_SEPARATOR) {
            self.parse_row(line_number, line)
        } else {
            Err(VoxelError::format(line_number, format!("unexpected line '{}'", line)))
        }
    }

    fn parse_section(line_number: usize, header: &str) -> Result<Section> {
        let mut parts = header.split_whitespace();
        let section = match (parts.next(), parts.next()) {
            (Some("info"), None) => Section::Info,
            (Some("blocks"), None) => Section::Blocks,
            (Some("layer"), Some(index)) => {
                let index = index.parse::<usize>().map_err(|_| {
                    VoxelError::format(line_number, format!("invalid layer index '{}'", index))
                })?;
                Section::Layer(index)
            }
            _ => {
                return Err(VoxelError::format(
                    line_number,
                    format!("unknown section '.{}'", header),
                ))
            }
        };

        if parts.next().is_some() {
            return Err(VoxelError::format(
                line_number,
                format!("too many arguments for section '.{}'", header),
            ));
        }
        Ok(section)
    }

    fn parse_variable(&mut self, line_number: usize, declaration: &str) -> Result<()> {
        let (key, value) = declaration.split_once('=').ok_or_else(|| {
            VoxelError::format(line_number, format!("expected '$name=value', got '${}'", declaration))
        })?;

        match self.section {
            Section::Info => self.parse_info_variable(line_number, key, value),
            Section::Blocks => {
                let mut chars = key.chars();
                let synonym = match (chars.next(), chars.next()) {
                    (Some(c), None) if c != AIR_SYNONYM && c != CELL_SEPARATOR => c,
                    _ => {
                        return Err(VoxelError::format(
                            line_number,
                            format!("block synonym must be a single character, got '{}'", key),
                        ))
                    }
                };
                let block = self.registry.by_name(value)?;
                self.synonyms.insert(synonym, block.default_state());
                Ok(())
            }
            _ => Err(VoxelError::format(
                line_number,
                format!("variable '{}' outside of the info or blocks section", key),
            )),
        }
    }

    fn parse_info_variable(&mut self, line_number: usize, key: &str, value: &str) -> Result<()> {
        let size = match key {
            "name" => {
                self.name = Some(value.to_string());
                return Ok(());
            }
            "sizeX" => &mut self.size_x,
            "sizeY" => &mut self.size_y,
            "sizeZ" => &mut self.size_z,
            _ => {
                return Err(VoxelError::format(
                    line_number,
                    format!("unknown info variable '{}'", key),
                ))
            }
        };
        if self.layers.is_some() {
            return Err(VoxelError::format(
                line_number,
                format!("'{}' changed after layer rows were declared", key),
            ));
        }

        match value.parse::<usize>() {
            Ok(parsed) if parsed > 0 => {
                *size = Some(parsed);
                Ok(())
            }
            _ => Err(VoxelError::format(
                line_number,
                format!("'{}' must be a positive integer, got '{}'", key, value),
            )),
        }
    }

    fn parse_row(&mut self, line_number: usize, line: &str) -> Result<()> {
        let Section::Layer(layer) = self.section else {
            return Err(VoxelError::format(line_number, "row outside of a layer section"));
        };
        let (Some(size_x), Some(size_y), Some(size_z)) = (self.size_x, self.size_y, self.size_z) else {
            return Err(VoxelError::format(
                line_number,
                "sizeX, sizeY and sizeZ must be declared before the first row",
            ));
        };
        if layer >= size_y {
            return Err(VoxelError::format(
                line_number,
                format!("layer {} is outside of sizeY {}", layer, size_y),
            ));
        }

        let mut cells: Vec<&str> = line[1..].split(CELL_SEPARATOR).collect();
        if cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        if cells.len() != size_x {
            return Err(VoxelError::format(
                line_number,
                format!("expected {} cells, found {}", size_x, cells.len()),
            ));
        }

        let row = cells
            .into_iter()
            .map(|cell| self.parse_cell(line_number, cell))
            .collect::<Result<Vec<_>>>()?;

        let rows = &mut self.layers.get_or_insert_with(|| vec![Vec::new(); size_y])[layer];
        if rows.len() >= size_z {
            return Err(VoxelError::format(
                line_number,
                format!("layer {} already has {} rows", layer, size_z),
            ));
        }
        rows.push(row);
        Ok(())
    }

    fn parse_cell(&self, line_number: usize, cell: &str) -> Result<BlockState> {
        let mut chars = cell.chars();
        match (chars.next(), chars.next()) {
            (Some(AIR_SYNONYM), None) => Ok(BlockState::AIR),
            (Some(synonym), None) => self.synonyms.get(&synonym).copied().ok_or_else(|| {
                VoxelError::format(line_number, format!("unknown block synonym '{}'", synonym))
            }),
            _ => Err(VoxelError::format(
                line_number,
                format!("cell '{}' must be exactly one character", cell),
            )),
        }
    }

    fn finish(self) -> Result<Structure> {
        let (Some(size_x), Some(size_y), Some(size_z)) = (self.size_x, self.size_y, self.size_z) else {
            return Err(VoxelError::format(0, "structure size is incomplete"));
        };
        let layers = self
            .layers
            .ok_or_else(|| VoxelError::format(0, "structure has no layers"))?;

        if let Some((layer, rows)) = layers.iter().enumerate().find(|(_, rows)| rows.len() != size_z) {
            return Err(VoxelError::format(
                0,
                format!("layer {} has {} rows, expected {}", layer, rows.len(), size_z),
            ));
        }

        // rows run along z, columns along x
        let mut blocks = vec![BlockState::AIR; size_x * size_y * size_z];
        for (y, rows) in layers.iter().enumerate() {
            for (z, row) in rows.iter().enumerate() {
                for (x, state) in row.iter().enumerate() {
                    blocks[Structure::index_of(size_x, size_z, x, y, z)] = *state;
                }
            }
        }

        Structure::new(self.name, (size_x, size_y, size_z), blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const HEADER: &str = ".info\n$sizeX=2\n$sizeY=1\n$sizeZ=2\n.blocks\n$s=stone\n";

    fn parse_err(text: &str) -> VoxelError {
        parse(text, &testing::registry()).unwrap_err()
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = format!("{}\n.layer 0\n\n|s| |\n| |s|\n\n", HEADER);
        let structure = parse(&text, &testing::registry()).unwrap();
        assert_eq!(structure.size(), (2, 1, 2));
    }

    #[test]
    fn unknown_synonym_is_rejected() {
        let error = parse_err(&format!("{}.layer 0\n|s|x|\n| | |\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 8, .. }), "{}", error);
    }

    #[test]
    fn rows_before_sizes_are_rejected() {
        let error = parse_err(".info\n$sizeX=1\n.layer 0\n| |\n");
        assert!(matches!(error, VoxelError::Format { line: 4, .. }), "{}", error);
    }

    #[test]
    fn layer_index_outside_size_is_rejected() {
        let error = parse_err(&format!("{}.layer 1\n|s|s|\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 8, .. }), "{}", error);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = parse_err(&format!("{}.layer 0\n|s|s|s|\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 8, .. }), "{}", error);

        let error = parse_err(&format!("{}.layer 0\n|s|\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 8, .. }), "{}", error);
    }

    #[test]
    fn too_many_or_too_few_rows_are_rejected() {
        let error = parse_err(&format!("{}.layer 0\n|s|s|\n|s|s|\n|s|s|\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 10, .. }), "{}", error);

        let error = parse_err(&format!("{}.layer 0\n|s|s|\n", HEADER));
        assert!(matches!(error, VoxelError::Format { line: 0, .. }), "{}", error);
    }

    #[test]
    fn unknown_sections_and_lines_are_rejected() {
        let error = parse_err(".colors\n");
        assert!(matches!(error, VoxelError::Format { line: 1, .. }), "{}", error);

        let error = parse_err(".info\nsizeX=2\n");
        assert!(matches!(error, VoxelError::Format { line: 2, .. }), "{}", error);
    }

    #[test]
    fn unregistered_block_name_is_a_registry_error() {
        let error = parse_err(".blocks\n$g=glass\n");
        assert!(matches!(error, VoxelError::Registry(_)), "{}", error);
    }

    #[test]
    fn multi_character_synonym_is_rejected() {
        let error = parse_err(".blocks\n$st=stone\n");
        assert!(matches!(error, VoxelError::Format { line: 2, .. }), "{}", error);
    }
}
