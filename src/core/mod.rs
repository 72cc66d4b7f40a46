//! # Core Module
//!
//! Concurrency primitives shared by the rest of the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking. The
//!   world lives in one so that mesh workers can read it while the main thread is the
//!   only writer.

pub mod mt_resource;

pub use mt_resource::MtResource;
