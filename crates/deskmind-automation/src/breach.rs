//! SLA breach detection.
//!
//! Breach checks are scheduled twice per ticket: once at the configured
//! lead time before the deadline (if that moment is still in the future)
//! and once exactly at the deadline. The check itself re-reads the live
//! ticket, so stale jobs from a recomputed deadline are harmless.

use std::sync::Arc;

use chrono::Utc;
use deskmind_core::{
    EscalationReason, NotificationKind, Ticket, TicketEvent, TicketEventType, TicketId,
    TicketStore,
};
use deskmind_scheduler::{JobId, JobPayload, JobScheduler};

use crate::error::{AutomationError, Result};

/// What a breach check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachCheckOutcome {
    /// Deadline passed; breach flagged and follow-up jobs enqueued
    Breached,
    /// Deadline passed but the breach was already flagged earlier
    AlreadyBreached,
    /// Deadline not reached yet
    NotDue,
    /// Ticket is resolved/closed/canceled; nothing to evaluate
    AlreadyResolved,
    /// Ticket carries no deadline
    NoDeadline,
}

/// Evaluates tickets against their SLA deadline.
pub struct SlaBreachMonitor {
    tickets: Arc<dyn TicketStore>,
    scheduler: Arc<JobScheduler>,
}

impl SlaBreachMonitor {
    pub fn new(tickets: Arc<dyn TicketStore>, scheduler: Arc<JobScheduler>) -> Self {
        Self { tickets, scheduler }
    }

    /// Evaluate one ticket against its deadline.
    ///
    /// On a fresh breach this appends the audit event and enqueues the
    /// breach notification and the auto-escalation as immediate jobs. A
    /// breach that was already flagged enqueues nothing, so a late lead
    /// check cannot double-escalate.
    pub async fn check(&self, ticket_id: TicketId) -> Result<BreachCheckOutcome> {
        let ticket = self
            .tickets
            .get(ticket_id)
            .await?
            .ok_or(AutomationError::TicketNotFound(ticket_id))?;

        if !ticket.sla_active() {
            return Ok(BreachCheckOutcome::AlreadyResolved);
        }
        let Some(due_at) = ticket.due_at else {
            return Ok(BreachCheckOutcome::NoDeadline);
        };
        if Utc::now() <= due_at {
            return Ok(BreachCheckOutcome::NotDue);
        }

        let already_flagged = self
            .tickets
            .events_for(ticket_id)
            .await?
            .iter()
            .any(|e| e.event_type == TicketEventType::SlaBreached);
        if already_flagged {
            return Ok(BreachCheckOutcome::AlreadyBreached);
        }

        let overdue_minutes = (Utc::now() - due_at).num_minutes();
        self.tickets
            .append_event(
                TicketEvent::new(
                    ticket_id,
                    None,
                    TicketEventType::SlaBreached,
                    format!(
                        "SLA deadline {} missed by {overdue_minutes} minutes",
                        due_at.to_rfc3339()
                    ),
                )
                .with_change(due_at.to_rfc3339(), Utc::now().to_rfc3339()),
            )
            .await?;

        self.scheduler
            .enqueue_now(JobPayload::SendNotification {
                kind: NotificationKind::SlaBreach,
                ticket_id,
                message: format!(
                    "Ticket {} missed its resolution deadline ({}).",
                    ticket.code,
                    due_at.to_rfc3339()
                ),
                user_ids: None,
            })
            .await;
        self.scheduler
            .enqueue_now(JobPayload::AutoEscalate {
                ticket_id,
                reason: EscalationReason::SlaBreach,
            })
            .await;

        tracing::warn!(
            ticket_id = %ticket_id,
            code = %ticket.code,
            due_at = %due_at,
            overdue_minutes,
            "SLA breach detected"
        );

        Ok(BreachCheckOutcome::Breached)
    }
}

/// Enqueue the two breach checks for a ticket's deadline.
///
/// The lead-time check is skipped when that moment is already in the past.
/// Returns the enqueued job IDs.
pub async fn schedule_breach_checks(
    scheduler: &JobScheduler,
    ticket: &Ticket,
    lead_minutes: i64,
) -> Vec<JobId> {
    let Some(due_at) = ticket.due_at else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    let lead = due_at - chrono::Duration::minutes(lead_minutes);
    if lead > Utc::now() {
        ids.push(
            scheduler
                .enqueue(
                    JobPayload::CheckSlaBreach {
                        ticket_id: ticket.id,
                    },
                    lead,
                )
                .await,
        );
    }
    ids.push(
        scheduler
            .enqueue(
                JobPayload::CheckSlaBreach {
                    ticket_id: ticket.id,
                },
                due_at,
            )
            .await,
    );
    ids
}
