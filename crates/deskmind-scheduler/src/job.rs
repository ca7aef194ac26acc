//! Job data structures.
//!
//! Jobs are typed: the payload is a tagged union keyed by job kind, so a
//! handler never has to parse an untyped blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use deskmind_core::{EscalationReason, NotificationKind, TicketId, UserId};

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of deferred work the scheduler dispatches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Evaluate a ticket against its SLA deadline
    CheckSlaBreach,
    /// Fan a notification out to its recipients
    SendNotification,
    /// Move a ticket to the next escalation tier
    AutoEscalate,
    /// Dispatch a CSAT survey for a resolved ticket
    SendCsatSurvey,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::CheckSlaBreach => "check_sla_breach",
            JobKind::SendNotification => "send_notification",
            JobKind::AutoEscalate => "auto_escalate",
            JobKind::SendCsatSurvey => "send_csat_survey",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed job payload, one variant per [`JobKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Evaluate the ticket against its SLA deadline.
    CheckSlaBreach { ticket_id: TicketId },
    /// Fan out a notification. `user_ids` overrides recipient resolution.
    SendNotification {
        kind: NotificationKind,
        ticket_id: TicketId,
        message: String,
        user_ids: Option<Vec<UserId>>,
    },
    /// Walk the escalation chain for the ticket.
    AutoEscalate {
        ticket_id: TicketId,
        reason: EscalationReason,
    },
    /// Dispatch the CSAT survey if the ticket is still resolved.
    SendCsatSurvey { ticket_id: TicketId },
}

impl JobPayload {
    /// The kind this payload dispatches to.
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::CheckSlaBreach { .. } => JobKind::CheckSlaBreach,
            JobPayload::SendNotification { .. } => JobKind::SendNotification,
            JobPayload::AutoEscalate { .. } => JobKind::AutoEscalate,
            JobPayload::SendCsatSurvey { .. } => JobKind::SendCsatSurvey,
        }
    }

    /// The ticket the job is about.
    pub fn ticket_id(&self) -> TicketId {
        match self {
            JobPayload::CheckSlaBreach { ticket_id }
            | JobPayload::SendNotification { ticket_id, .. }
            | JobPayload::AutoEscalate { ticket_id, .. }
            | JobPayload::SendCsatSurvey { ticket_id } => *ticket_id,
        }
    }
}

/// The tagged result of one job execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Work done (or deliberately declined); retire the job.
    Completed,
    /// Transient failure; run again after backoff.
    Retry { reason: String },
    /// Terminal failure; retire the job into the dead letter list.
    Dead { reason: String },
}

/// Backoff policy for retried jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of execution attempts before dead-lettering
    pub max_attempts: u32,
    /// Initial retry delay in milliseconds
    pub initial_delay_ms: u64,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: deskmind_core::config::defaults::MAX_JOB_ATTEMPTS,
            initial_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 3_600_000,
        }
    }
}

impl RetryPolicy {
    /// Calculate the retry delay for a given attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = (self.initial_delay_ms as f64
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32))
        .min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay)
    }
}

/// One record in the scheduler's job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,
    /// Typed payload
    pub payload: JobPayload,
    /// Earliest time the job may run
    pub scheduled_for: DateTime<Utc>,
    /// Whether the job has been retired
    pub completed: bool,
    /// Number of execution attempts so far
    pub attempt: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When the job was retired
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(payload: JobPayload, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            payload,
            scheduled_for,
            completed: false,
            attempt: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Check if the job is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.scheduled_for <= now
    }
}

/// A job that failed terminally, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadJob {
    /// The job as it looked when it died
    pub job: Job,
    /// Why it died
    pub reason: String,
    /// When it died
    pub died_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn payload() -> JobPayload {
        JobPayload::CheckSlaBreach {
            ticket_id: TicketId::new(),
        }
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(payload().kind(), JobKind::CheckSlaBreach);
        let p = JobPayload::SendNotification {
            kind: NotificationKind::SlaBreach,
            ticket_id: TicketId::new(),
            message: "deadline missed".to_string(),
            user_ids: None,
        };
        assert_eq!(p.kind(), JobKind::SendNotification);
        let p = JobPayload::AutoEscalate {
            ticket_id: TicketId::new(),
            reason: EscalationReason::SlaBreach,
        };
        assert_eq!(p.kind(), JobKind::AutoEscalate);
    }

    #[test]
    fn test_job_is_due() {
        let now = Utc::now();
        let mut job = Job::new(payload(), now - ChronoDuration::seconds(1));
        assert!(job.is_due(now));

        job.scheduled_for = now + ChronoDuration::seconds(60);
        assert!(!job.is_due(now));

        job.scheduled_for = now;
        assert!(job.is_due(now));

        job.completed = true;
        assert!(!job.is_due(now));
    }

    #[test]
    fn test_retry_policy_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
        };

        assert_eq!(policy.delay_for_attempt(1).as_millis(), 1000);
        assert_eq!(policy.delay_for_attempt(2).as_millis(), 2000);
        assert_eq!(policy.delay_for_attempt(3).as_millis(), 4000);
        assert_eq!(policy.delay_for_attempt(4).as_millis(), 8000);
        assert_eq!(policy.delay_for_attempt(5).as_millis(), 10_000); // capped
    }

    #[test]
    fn test_payload_serde_tag() {
        let p = JobPayload::SendCsatSurvey {
            ticket_id: TicketId::new(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "send_csat_survey");
    }
}
