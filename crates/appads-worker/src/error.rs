//! Errors a submitted task can resolve to.

use thiserror::Error;

/// Why a task submitted to the worker pool failed to produce a result.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WorkerError {
    /// The task exceeded `taskTimeout` and was abandoned.
    #[error("worker task exceeded its timeout")]
    Timeout,
    /// The task panicked while executing.
    #[error("worker task panicked")]
    Panicked,
    /// The pool's measured RSS or heap usage exceeded the configured cap;
    /// the task was refused rather than run.
    #[error("worker pool is over its memory budget")]
    Oom,
    /// The pool is shutting down and no longer accepts work.
    #[error("worker pool is shutting down")]
    Closed,
}
