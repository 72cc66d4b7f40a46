//! Background tasks for the rendering system.
//!
//! Mesh generation reads a consistent snapshot of the world on a worker thread;
//! only installing the finished geometry into the scene happens on the main thread.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Builds the geometry of one chunk in the background

pub mod chunk_mesh_generation_task;
