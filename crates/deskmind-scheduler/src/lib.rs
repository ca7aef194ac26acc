//! Delayed job scheduling for DeskMind.
//!
//! A time-ordered in-memory job queue: callers enqueue typed payloads with
//! a due time, a tick loop executes due jobs through registered handlers,
//! and outcomes decide between retirement, backoff retry and the dead
//! letter list.

pub mod error;
pub mod job;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use job::{DeadJob, Job, JobId, JobKind, JobOutcome, JobPayload, RetryPolicy};
pub use scheduler::{
    JobHandler, JobScheduler, SchedulerConfig, SchedulerStats, TickSummary,
};
