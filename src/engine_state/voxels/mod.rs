//! # Voxel World
//!
//! This module contains the data side of the engine: what a block is, how blocks
//! are grouped into chunks and how chunks make up a sparse world.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Block types, their textures and tints, and the registry mapping ids and names to types
//! * **Position**: Integer block and chunk coordinates with floor-based conversion
//! * **Chunk**: Dense 16×16×16 arrays of block states
//! * **World**: A sparse map of chunks with block-change notifications
//! * **Structure**: Prefabricated block patterns parsed from a small text format
//! * **Generation**: Generators that fill fresh chunks (ground plane, trees)
//! * **Tasks**: Background chunk generation
//!
//! ## Data Flow
//!
//! 1. The displayer asks for chunks around the viewer
//! 2. Chunk generation tasks build and populate chunks on worker threads
//! 3. Finished chunks are inserted into the world on the main thread
//! 4. Insertions and block edits trigger mesh regeneration tasks
//!
//! ## Thread Safety
//!
//! The world is only mutated on the main thread. Workers read it through a shared
//! read lock while meshing, so they always see a consistent snapshot.

pub mod block;
pub mod chunk;
pub mod generation;
pub mod position;
pub mod structure;
pub mod tasks;
pub mod world;
