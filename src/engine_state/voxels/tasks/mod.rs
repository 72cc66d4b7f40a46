//! # Voxel Task System
//!
//! Tasks related to voxel world generation. Generation runs on worker threads so
//! that streaming new terrain never stalls the main thread.

pub mod chunk_generation_task;
