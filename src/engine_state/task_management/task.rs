//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`, which travels through the bounded result queue
//! 4. The result's `handle_result()` is called on the main thread
//! 5. The result can spawn new tasks, forming the next stage of the pipeline

use crate::engine_state::pipeline_context::PipelineContext;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the main thread to
/// background workers. They own (or share through `Arc`) all the data they need.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Failures are reported through the result, never by panicking
pub trait Task: Send {
    /// Processes the task on a worker thread and returns a result.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// A trait representing the result of processing a `Task`.
///
/// Task results are processed on the main thread and may:
/// - Spawn new tasks for the next pipeline stage
/// - Update main-thread state (the world, installed chunk visuals) through the
///   provided [`PipelineContext`]
pub trait TaskResult: Send {
    /// Handles the result of a completed task on the main thread.
    ///
    /// Runs once per frame for every finished task, so it should stay cheap.
    ///
    /// # Returns
    /// New tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, context: &mut PipelineContext) -> Vec<Box<dyn Task + Send>>;
}
