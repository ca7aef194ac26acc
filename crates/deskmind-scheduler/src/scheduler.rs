//! The delayed job scheduler.
//!
//! An explicit scheduler object owning its in-memory job store. Callers
//! enqueue typed payloads with a due time; `tick()` executes every due job
//! at most once per attempt and applies the handler's outcome. Tests drive
//! `tick()` directly; production runs the interval loop via `start()`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{Result, SchedulerError};
use crate::job::{DeadJob, Job, JobId, JobKind, JobOutcome, JobPayload, RetryPolicy};

/// Executes jobs of one kind.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run one attempt of the job and report what should happen to it.
    async fn execute(&self, job: &Job) -> JobOutcome;
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between ticks of the background loop, in seconds
    pub tick_interval_secs: u64,
    /// How long retired jobs are kept before garbage collection, in minutes
    pub retention_minutes: i64,
    /// Backoff policy applied to retried jobs
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: deskmind_core::config::defaults::TICK_INTERVAL_SECS,
            retention_minutes: deskmind_core::config::defaults::JOB_RETENTION_MINUTES,
            retry: RetryPolicy::default(),
        }
    }
}

/// What one `tick()` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Due jobs dispatched to a handler
    pub executed: usize,
    /// Jobs retired successfully
    pub completed: usize,
    /// Jobs rescheduled for another attempt
    pub retried: usize,
    /// Jobs moved to the dead letter list
    pub dead: usize,
    /// Retired jobs purged by garbage collection
    pub purged: usize,
}

/// Lifetime counters for the scheduler.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub enqueued: u64,
    pub executed: u64,
    pub completed: u64,
    pub retried: u64,
    pub dead: u64,
}

/// Time-ordered job queue with a cooperative tick loop.
#[derive(Clone)]
pub struct JobScheduler {
    config: SchedulerConfig,
    jobs: Arc<RwLock<Vec<Job>>>,
    handlers: Arc<RwLock<HashMap<JobKind, Arc<dyn JobHandler>>>>,
    dead_letter: Arc<RwLock<Vec<DeadJob>>>,
    stats: Arc<RwLock<SchedulerStats>>,
    /// Prevents tick re-entry; double execution of a due job is otherwise
    /// possible with overlapping ticks.
    tick_lock: Arc<Mutex<()>>,
    running: Arc<RwLock<bool>>,
    task_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl JobScheduler {
    /// Create a scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            jobs: Arc::new(RwLock::new(Vec::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            dead_letter: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(SchedulerStats::default())),
            tick_lock: Arc::new(Mutex::new(())),
            running: Arc::new(RwLock::new(false)),
            task_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Register the handler for a job kind, replacing any previous one.
    pub async fn register_handler(&self, kind: JobKind, handler: Arc<dyn JobHandler>) {
        self.handlers.write().await.insert(kind, handler);
    }

    /// Enqueue a job to run no earlier than `scheduled_for`.
    ///
    /// Always succeeds; payload semantics are the handler's business.
    pub async fn enqueue(&self, payload: JobPayload, scheduled_for: DateTime<Utc>) -> JobId {
        let job = Job::new(payload, scheduled_for);
        let id = job.id;
        tracing::debug!(
            job_id = %id,
            kind = %job.payload.kind(),
            scheduled_for = %scheduled_for,
            "Job enqueued"
        );
        self.jobs.write().await.push(job);
        self.stats.write().await.enqueued += 1;
        id
    }

    /// Enqueue a job to run at the next tick.
    pub async fn enqueue_now(&self, payload: JobPayload) -> JobId {
        self.enqueue(payload, Utc::now()).await
    }

    /// Execute all due jobs, apply their outcomes, and garbage-collect.
    ///
    /// Due jobs run in insertion order; there is no priority ordering.
    /// Jobs enqueued during a tick are picked up from the next tick on.
    pub async fn tick(&self) -> TickSummary {
        let _guard = self.tick_lock.lock().await;
        let now = Utc::now();
        let mut summary = TickSummary::default();

        let due: Vec<Job> = {
            let jobs = self.jobs.read().await;
            jobs.iter().filter(|j| j.is_due(now)).cloned().collect()
        };

        for job in due {
            summary.executed += 1;
            let handler = self.handlers.read().await.get(&job.payload.kind()).cloned();
            let outcome = match handler {
                Some(handler) => handler.execute(&job).await,
                None => JobOutcome::Dead {
                    reason: format!("no handler registered for {}", job.payload.kind()),
                },
            };
            self.apply_outcome(&job, outcome, &mut summary).await;
        }

        summary.purged = self.collect_garbage(now).await;

        {
            let mut stats = self.stats.write().await;
            stats.executed += summary.executed as u64;
            stats.completed += summary.completed as u64;
            stats.retried += summary.retried as u64;
            stats.dead += summary.dead as u64;
        }

        summary
    }

    async fn apply_outcome(&self, executed: &Job, outcome: JobOutcome, summary: &mut TickSummary) {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.iter_mut().find(|j| j.id == executed.id) else {
            return;
        };

        match outcome {
            JobOutcome::Completed => {
                job.completed = true;
                job.completed_at = Some(now);
                summary.completed += 1;
            }
            JobOutcome::Retry { reason } => {
                job.attempt += 1;
                if job.attempt >= self.config.retry.max_attempts {
                    job.completed = true;
                    job.completed_at = Some(now);
                    let dead = DeadJob {
                        job: job.clone(),
                        reason: format!(
                            "retries exhausted after {} attempts: {reason}",
                            job.attempt
                        ),
                        died_at: now,
                    };
                    tracing::error!(
                        job_id = %job.id,
                        kind = %job.payload.kind(),
                        attempts = job.attempt,
                        reason = %reason,
                        "Job dead-lettered after exhausting retries"
                    );
                    drop(jobs);
                    self.dead_letter.write().await.push(dead);
                    summary.dead += 1;
                } else {
                    let delay = self.config.retry.delay_for_attempt(job.attempt);
                    job.scheduled_for = now
                        + chrono::Duration::from_std(delay)
                            .unwrap_or_else(|_| chrono::Duration::zero());
                    tracing::warn!(
                        job_id = %job.id,
                        kind = %job.payload.kind(),
                        attempt = job.attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Job execution failed, retrying with backoff"
                    );
                    summary.retried += 1;
                }
            }
            JobOutcome::Dead { reason } => {
                job.completed = true;
                job.completed_at = Some(now);
                let dead = DeadJob {
                    job: job.clone(),
                    reason: reason.clone(),
                    died_at: now,
                };
                tracing::error!(
                    job_id = %job.id,
                    kind = %job.payload.kind(),
                    reason = %reason,
                    "Job dead-lettered"
                );
                drop(jobs);
                self.dead_letter.write().await.push(dead);
                summary.dead += 1;
            }
        }
    }

    /// Purge retired jobs older than the retention window.
    async fn collect_garbage(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::minutes(self.config.retention_minutes);
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|j| !(j.completed && j.scheduled_for < cutoff));
        before - jobs.len()
    }

    /// Start the background tick loop.
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(SchedulerError::AlreadyRunning);
            }
            *running = true;
        }

        let scheduler = self.clone();
        let interval = Duration::from_secs(self.config.tick_interval_secs);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                {
                    let running = scheduler.running.read().await;
                    if !*running {
                        break;
                    }
                }
                scheduler.tick().await;
            }
        });

        *self.task_handle.write().await = Some(handle);
        tracing::info!(
            interval_secs = self.config.tick_interval_secs,
            "Job scheduler started"
        );
        Ok(())
    }

    /// Stop the background tick loop.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                return Err(SchedulerError::NotRunning);
            }
            *running = false;
        }

        let mut task = self.task_handle.write().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
        tracing::info!("Job scheduler stopped");
        Ok(())
    }

    /// Check if the background loop is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Fetch a job record by ID.
    pub async fn job(&self, id: JobId) -> Option<Job> {
        self.jobs.read().await.iter().find(|j| j.id == id).cloned()
    }

    /// Number of jobs not yet retired.
    pub async fn pending_count(&self) -> usize {
        self.jobs.read().await.iter().filter(|j| !j.completed).count()
    }

    /// The dead letter list, oldest first.
    pub async fn dead_letter(&self) -> Vec<DeadJob> {
        self.dead_letter.read().await.clone()
    }

    /// Lifetime counters.
    pub async fn stats(&self) -> SchedulerStats {
        *self.stats.read().await
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskmind_core::TicketId;
    use tokio::sync::Mutex as AsyncMutex;

    /// Handler that records executions and returns a configured outcome.
    struct ScriptedHandler {
        executions: Arc<AsyncMutex<Vec<JobId>>>,
        outcome: JobOutcome,
    }

    impl ScriptedHandler {
        fn completing() -> (Arc<Self>, Arc<AsyncMutex<Vec<JobId>>>) {
            Self::with_outcome(JobOutcome::Completed)
        }

        fn with_outcome(outcome: JobOutcome) -> (Arc<Self>, Arc<AsyncMutex<Vec<JobId>>>) {
            let executions = Arc::new(AsyncMutex::new(Vec::new()));
            (
                Arc::new(Self {
                    executions: executions.clone(),
                    outcome,
                }),
                executions,
            )
        }
    }

    #[async_trait]
    impl JobHandler for ScriptedHandler {
        async fn execute(&self, job: &Job) -> JobOutcome {
            self.executions.lock().await.push(job.id);
            self.outcome.clone()
        }
    }

    fn breach_payload() -> JobPayload {
        JobPayload::CheckSlaBreach {
            ticket_id: TicketId::new(),
        }
    }

    fn fast_retry_config(max_attempts: u32) -> SchedulerConfig {
        SchedulerConfig {
            retry: RetryPolicy {
                max_attempts,
                initial_delay_ms: 0,
                backoff_multiplier: 2.0,
                max_delay_ms: 0,
            },
            ..SchedulerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_future_job_not_executed() {
        let scheduler = JobScheduler::default();
        let (handler, executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        let id = scheduler
            .enqueue(breach_payload(), Utc::now() + chrono::Duration::hours(1))
            .await;

        let summary = scheduler.tick().await;
        assert_eq!(summary.executed, 0);
        assert!(executions.lock().await.is_empty());
        assert!(!scheduler.job(id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_due_job_executed_once() {
        let scheduler = JobScheduler::default();
        let (handler, executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        let id = scheduler
            .enqueue(breach_payload(), Utc::now() - chrono::Duration::seconds(1))
            .await;

        let summary = scheduler.tick().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.completed, 1);
        assert!(scheduler.job(id).await.unwrap().completed);

        // A completed job is never re-executed by later ticks.
        let summary = scheduler.tick().await;
        assert_eq!(summary.executed, 0);
        assert_eq!(executions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_due_jobs_run_in_insertion_order() {
        let scheduler = JobScheduler::default();
        let (handler, executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        let now = Utc::now();
        // Later deadline enqueued first: insertion order wins, not due order.
        let first = scheduler
            .enqueue(breach_payload(), now - chrono::Duration::seconds(1))
            .await;
        let second = scheduler
            .enqueue(breach_payload(), now - chrono::Duration::seconds(30))
            .await;

        scheduler.tick().await;
        let order = executions.lock().await.clone();
        assert_eq!(order, vec![first, second]);
    }

    #[tokio::test]
    async fn test_retry_then_dead_letter() {
        let scheduler = JobScheduler::new(fast_retry_config(2));
        let (handler, executions) = ScriptedHandler::with_outcome(JobOutcome::Retry {
            reason: "mail relay timeout".to_string(),
        });
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        let id = scheduler.enqueue_now(breach_payload()).await;

        // First attempt: rescheduled with zero backoff.
        let summary = scheduler.tick().await;
        assert_eq!(summary.retried, 1);
        assert_eq!(scheduler.job(id).await.unwrap().attempt, 1);
        assert!(!scheduler.job(id).await.unwrap().completed);

        // Second attempt exhausts max_attempts and dead-letters.
        let summary = scheduler.tick().await;
        assert_eq!(summary.dead, 1);
        assert!(scheduler.job(id).await.unwrap().completed);

        let dead = scheduler.dead_letter().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].job.id, id);
        assert!(dead[0].reason.contains("mail relay timeout"));
        assert_eq!(executions.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_terminal_failure_dead_letters_immediately() {
        let scheduler = JobScheduler::default();
        let (handler, _executions) = ScriptedHandler::with_outcome(JobOutcome::Dead {
            reason: "ticket no longer exists".to_string(),
        });
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        scheduler.enqueue_now(breach_payload()).await;
        let summary = scheduler.tick().await;
        assert_eq!(summary.dead, 1);
        assert_eq!(scheduler.dead_letter().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_handler_dead_letters() {
        let scheduler = JobScheduler::default();
        scheduler.enqueue_now(breach_payload()).await;

        let summary = scheduler.tick().await;
        assert_eq!(summary.dead, 1);
        let dead = scheduler.dead_letter().await;
        assert!(dead[0].reason.contains("no handler registered"));
    }

    #[tokio::test]
    async fn test_retired_jobs_kept_within_retention() {
        let scheduler = JobScheduler::default(); // 60 minute retention
        let (handler, _executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        let id = scheduler
            .enqueue(breach_payload(), Utc::now() - chrono::Duration::minutes(5))
            .await;

        let summary = scheduler.tick().await;
        assert_eq!(summary.purged, 0);
        assert!(scheduler.job(id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_garbage_collection_purges_old_retired_jobs() {
        let config = SchedulerConfig {
            retention_minutes: 0,
            ..SchedulerConfig::default()
        };
        let scheduler = JobScheduler::new(config);
        let (handler, _executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        // Scheduled well in the past: with zero retention the job is
        // already past the cutoff once it completes, so the same tick
        // that retires it purges it.
        let id = scheduler
            .enqueue(breach_payload(), Utc::now() - chrono::Duration::minutes(5))
            .await;

        let summary = scheduler.tick().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.purged, 1);
        assert!(scheduler.job(id).await.is_none());
        assert_eq!(scheduler.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_incomplete_jobs_survive_gc() {
        let config = SchedulerConfig {
            retention_minutes: 0,
            ..SchedulerConfig::default()
        };
        let scheduler = JobScheduler::new(config);

        let id = scheduler
            .enqueue(breach_payload(), Utc::now() + chrono::Duration::hours(2))
            .await;
        scheduler.tick().await;
        assert!(scheduler.job(id).await.is_some());
    }

    #[tokio::test]
    async fn test_lifecycle_start_stop() {
        let scheduler = JobScheduler::default();
        assert!(!scheduler.is_running().await);
        assert_eq!(scheduler.stop().await, Err(SchedulerError::NotRunning));

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running().await);
        assert_eq!(scheduler.start().await, Err(SchedulerError::AlreadyRunning));

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn test_stats_accumulate() {
        let scheduler = JobScheduler::default();
        let (handler, _executions) = ScriptedHandler::completing();
        scheduler
            .register_handler(JobKind::CheckSlaBreach, handler)
            .await;

        scheduler.enqueue_now(breach_payload()).await;
        scheduler.enqueue_now(breach_payload()).await;
        scheduler.tick().await;

        let stats = scheduler.stats().await;
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.executed, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.dead, 0);
    }
}
