//! Error types for queue operations.

use thiserror::Error;

/// Errors from creating or feeding a [`TaskQueue`](super::TaskQueue).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Concurrency outside `1..=100`.
    #[error("invalid concurrency {value}: must be between 1 and 100")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// No worker is left to accept the task.
    #[error("task queue is closed")]
    Closed,
}
