//! Error types for the job scheduler.

use thiserror::Error;

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors surfaced by the scheduler lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` was called while the tick loop is already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `stop` was called while the tick loop is not running.
    #[error("scheduler is not running")]
    NotRunning,
}
