//! # World Generation
//!
//! Generators populate freshly created (all air) chunks. They run on worker threads,
//! so every generator is `Send + Sync`; generators with random state keep it behind a
//! mutex.
//!
//! The default world is a flat grass plane at local height 0 of every chunk with at
//! most one tree per chunk on top of it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::error::{Result, VoxelError};

use super::block::{registry::BlockRegistry, BlockState};
use super::chunk::{Chunk, CHUNK_DIMENSION};
use super::structure::Structure;

/// Fills a chunk with content.
pub trait WorldGenerator: Send + Sync {
    /// Populates `chunk`, which is expected to be freshly created.
    fn generate(&self, chunk: &mut Chunk) -> Result<()>;
}

/// Sets the bottom layer (local `y = 0`) of every chunk to one block.
#[derive(Debug)]
pub struct SurfaceGenerator {
    block: BlockState,
}

impl SurfaceGenerator {
    /// Creates a generator laying down `block`.
    pub fn new(block: BlockState) -> Self {
        SurfaceGenerator { block }
    }
}

impl WorldGenerator for SurfaceGenerator {
    fn generate(&self, chunk: &mut Chunk) -> Result<()> {
        for x in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                chunk.set_local(x, 0, z, self.block)?;
            }
        }
        Ok(())
    }
}

/// Stamps a structure into chunks at random positions.
///
/// With probability `chance` a chunk receives one copy of the structure. The
/// horizontal offset is drawn so that a one block margin stays free on every side
/// of the chunk; the height is either fixed or drawn the same way.
#[derive(Debug)]
pub struct StructureGenerator {
    structure: Arc<Structure>,
    chance: f32,
    base_y: Option<i32>,
    rng: Mutex<fastrand::Rng>,
}

impl StructureGenerator {
    /// Creates a generator placing `structure`.
    ///
    /// # Errors
    /// [`VoxelError::OutOfBounds`] if the structure cannot fit inside a chunk with
    /// the margin, or at `base_y`.
    pub fn new(structure: Arc<Structure>, chance: f32, base_y: Option<i32>, seed: u64) -> Result<Self> {
        let (size_x, size_y, size_z) = structure.size();
        let y = base_y.unwrap_or(1);
        if !structure.fits_at(1, y, 1)
            || size_x as i32 + 2 > CHUNK_DIMENSION
            || size_z as i32 + 2 > CHUNK_DIMENSION
            || (base_y.is_none() && size_y as i32 + 2 > CHUNK_DIMENSION)
        {
            return Err(VoxelError::OutOfBounds {
                x: size_x as i32,
                y: y + size_y as i32,
                z: size_z as i32,
                extent: "chunk",
            });
        }

        Ok(StructureGenerator {
            structure,
            chance: chance.clamp(0.0, 1.0),
            base_y,
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        })
    }

    /// A generator planting the bundled tree as configured.
    pub fn trees(registry: &BlockRegistry, config: &EngineConfig, seed: u64) -> Result<Self> {
        let tree = Arc::new(Structure::tree(registry)?);
        Self::new(tree, config.tree_chance, config.tree_base_y, seed)
    }

    /// The structure this generator places.
    pub fn structure(&self) -> &Structure {
        &self.structure
    }
}

impl WorldGenerator for StructureGenerator {
    fn generate(&self, chunk: &mut Chunk) -> Result<()> {
        let (size_x, size_y, size_z) = self.structure.size();
        let (x, y, z) = {
            let mut rng = self.rng.lock();
            if rng.f32() >= self.chance {
                return Ok(());
            }
            let x = rng.i32(1..=CHUNK_DIMENSION - 1 - size_x as i32);
            let z = rng.i32(1..=CHUNK_DIMENSION - 1 - size_z as i32);
            let y = match self.base_y {
                Some(y) => y,
                None => rng.i32(1..=CHUNK_DIMENSION - 1 - size_y as i32),
            };
            (x, y, z)
        };
        self.structure.place_into(chunk, x, y, z)
    }
}

/// Runs several generators in order.
#[derive(Default)]
pub struct GeneratorSequence {
    generators: Vec<Box<dyn WorldGenerator>>,
}

impl GeneratorSequence {
    /// Creates a sequence.
    pub fn new(generators: Vec<Box<dyn WorldGenerator>>) -> Self {
        GeneratorSequence { generators }
    }

    /// Appends a generator.
    pub fn push(&mut self, generator: Box<dyn WorldGenerator>) {
        self.generators.push(generator);
    }

    /// Grass surface followed by trees, seeded from `seed`.
    pub fn surface_with_trees(registry: &BlockRegistry, config: &EngineConfig, seed: u64) -> Result<Self> {
        let grass = registry.by_name("grass")?.default_state();
        Ok(GeneratorSequence::new(vec![
            Box::new(SurfaceGenerator::new(grass)),
            Box::new(StructureGenerator::trees(registry, config, seed)?),
        ]))
    }
}

impl WorldGenerator for GeneratorSequence {
    fn generate(&self, chunk: &mut Chunk) -> Result<()> {
        for generator in &self.generators {
            generator.generate(chunk)?;
        }
        Ok(())
    }
}
