//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation and meshing off
//! the main thread.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: Communication channel between the main thread and one worker thread
//!
//! Every worker owns a dedicated task channel and is fed round-robin, with at most
//! [`MAX_TASKS_IN_FLIGHT`] tasks at a time; everything else waits in a queue on the
//! main thread. All workers report into one shared bounded result queue. A worker
//! that cannot enqueue its result within the configured timeout drops it, logs a
//! warning and hands the task back to the main thread, which publishes it again. A
//! stalled main thread never blocks the workers for long and no work is lost.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and push results onto the bounded result queue
//! 4. Results are processed on the main thread in `process_completed_tasks()`
//!
//! ## Example
//! ```ignore
//! let mut task_manager = TaskManager::new(4, 100, Duration::from_millis(50), context);
//! task_manager.publish_task(Box::new(ChunkGenerationTask::new(generator, position)));
//!
//! // In the main loop:
//! task_manager.process_completed_tasks();
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use log::{debug, info, warn};
use task::{Task, TaskResult};

use super::pipeline_context::PipelineContext;

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `tasks_in_flight`: Tasks handed to the worker and not finished yet; the worker
///   decrements it once the result is enqueued or dropped
/// - `_worker`: Handle to the worker thread
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    tasks_in_flight: Arc<AtomicUsize>,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and managing worker threads
/// - Distributing tasks across available workers
/// - Collecting and processing task results
/// - Handling task queuing when all workers are busy
///
/// It owns the [`PipelineContext`] handed to every result on the main thread.
/// Dropping the manager closes the task channels, which stops the workers once they
/// finish their current task.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    /// Tasks whose results were dropped, waiting to be published again
    returned_receiver: Receiver<Box<dyn Task + Send>>,
    dropped_results: Arc<AtomicUsize>,
    context: PipelineContext,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 so a busy worker never accumulates a backlog while another one
/// is idle; waiting tasks stay in the main-thread queue instead.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create (at least one is created)
    /// * `result_capacity` - Capacity of the shared result queue
    /// * `send_timeout` - How long a worker waits on a full result queue before dropping its result
    /// * `context` - Main-thread state handed to every task result
    ///
    /// # Panics
    /// Panics if the underlying thread creation fails.
    pub fn new(
        num_workers: usize,
        result_capacity: usize,
        send_timeout: Duration,
        context: PipelineContext,
    ) -> Self {
        let num_workers = num_workers.max(1);
        let (result_tx, result_rx) = bounded::<Box<dyn TaskResult + Send>>(result_capacity.max(1));
        let (returned_tx, returned_rx) = unbounded::<Box<dyn Task + Send>>();
        let dropped_results = Arc::new(AtomicUsize::new(0));

        info!(
            "Starting {} workers, available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let (task_tx, task_rx) = unbounded::<Box<dyn Task + Send>>();
            let result_tx = result_tx.clone();
            let returned_tx = returned_tx.clone();
            let tasks_in_flight = Arc::new(AtomicUsize::new(0));
            let worker_in_flight = tasks_in_flight.clone();
            let worker_dropped = dropped_results.clone();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    let disconnected = match result_tx.send_timeout(result, send_timeout) {
                        Ok(()) => false,
                        Err(SendTimeoutError::Timeout(_)) => {
                            let dropped = worker_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                            warn!(
                                "Result queue full for {:?}, dropped a task result ({} dropped so far)",
                                send_timeout, dropped
                            );
                            // Returned before the in-flight count drops so `is_idle` never sees a gap.
                            returned_tx.send(task).is_err()
                        }
                        Err(SendTimeoutError::Disconnected(_)) => true,
                    };
                    worker_in_flight.fetch_sub(1, Ordering::AcqRel);
                    if disconnected {
                        break;
                    }
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                tasks_in_flight,
                _worker: thread::spawn(task_closure),
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            result_receiver: result_rx,
            returned_receiver: returned_rx,
            dropped_results,
            context,
        }
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Gives the task back if the worker is gone.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        let channel = &self.channels[channel_idx];
        // Counted before sending so the worker's decrement can never run first.
        channel.tasks_in_flight.fetch_add(1, Ordering::AcqRel);
        match channel.task_sender.send(task) {
            Ok(()) => Ok(()),
            Err(err) => {
                channel.tasks_in_flight.fetch_sub(1, Ordering::AcqRel);
                Err(err.into_inner())
            }
        }
    }

    /// Finds the next channel below [`MAX_TASKS_IN_FLIGHT`], starting at the
    /// round-robin cursor.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].tasks_in_flight.load(Ordering::Acquire) < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a task for execution.
    ///
    /// The task goes straight to an idle worker if there is one and is queued
    /// otherwise. Returns whether it was dispatched immediately.
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(()) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers that became idle, in publish order.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Drains the result queue and handles every result on the calling thread.
    ///
    /// Follow-up tasks returned by the results are published afterwards, together with
    /// the tasks whose results were dropped. Returns the number of results handled.
    pub fn process_completed_tasks(&mut self) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        while let Ok(result) = self.result_receiver.try_recv() {
            tasks_to_queue.extend(result.handle_result(&mut self.context));
            handled += 1;
        }

        let returned_before = tasks_to_queue.len();
        tasks_to_queue.extend(self.returned_receiver.try_iter());
        let returned = tasks_to_queue.len() - returned_before;
        if returned > 0 {
            debug!("Publishing {} tasks again after their results were dropped", returned);
        }

        if handled > 0 {
            debug!(
                "Handled {} task results, {} follow-up tasks",
                handled,
                tasks_to_queue.len()
            );
        }
        for task in tasks_to_queue {
            self.publish_task(task);
        }
        handled
    }

    /// Number of tasks currently being processed by workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.tasks_in_flight.load(Ordering::Acquire))
            .sum()
    }

    /// Number of tasks waiting for an idle worker.
    pub fn queued_task_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Number of results workers had to drop because the result queue stayed full.
    pub fn dropped_results(&self) -> usize {
        self.dropped_results.load(Ordering::Relaxed)
    }

    /// Whether no task is queued, running or waiting to be handled.
    pub fn is_idle(&self) -> bool {
        // In-flight first: workers fill the channels before they decrement it.
        self.queued_tasks.is_empty()
            && self.tasks_in_flight() == 0
            && self.result_receiver.is_empty()
            && self.returned_receiver.is_empty()
    }

    /// The main-thread pipeline state.
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Mutable access to the main-thread pipeline state.
    pub fn context_mut(&mut self) -> &mut PipelineContext {
        &mut self.context
    }
}
