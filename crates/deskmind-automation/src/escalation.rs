//! Ticket escalation.
//!
//! Escalation follows the explicit `escalates_to` link on the ticket's
//! current team. Reassignment clears the assignee so the receiving team
//! can self-assign; requester and priority are untouched.

use std::sync::Arc;

use chrono::Utc;
use deskmind_core::{
    DirectoryStore, EscalationReason, NotificationKind, TeamId, TicketEvent, TicketEventType,
    TicketId, TicketStore,
};
use deskmind_scheduler::{JobPayload, JobScheduler};

use crate::error::{AutomationError, Result};

/// What an escalation attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Ticket moved to the next tier
    Escalated { from_team: TeamId, to_team: TeamId },
    /// Ticket already left the active workflow; nothing to escalate
    TicketInactive,
}

/// Walks the team escalation chain and reassigns ticket ownership.
pub struct EscalationEngine {
    tickets: Arc<dyn TicketStore>,
    directory: Arc<dyn DirectoryStore>,
    scheduler: Arc<JobScheduler>,
}

impl EscalationEngine {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        directory: Arc<dyn DirectoryStore>,
        scheduler: Arc<JobScheduler>,
    ) -> Self {
        Self {
            tickets,
            directory,
            scheduler,
        }
    }

    /// Move a ticket to the next tier of its team's escalation chain.
    ///
    /// A missing team or a team without an `escalates_to` link is a
    /// surfaced configuration error, never a silent no-op.
    pub async fn auto_escalate(
        &self,
        ticket_id: TicketId,
        reason: EscalationReason,
    ) -> Result<EscalationOutcome> {
        let mut ticket = self
            .tickets
            .get(ticket_id)
            .await?
            .ok_or(AutomationError::TicketNotFound(ticket_id))?;

        if !ticket.sla_active() {
            tracing::info!(
                ticket_id = %ticket_id,
                status = %ticket.status,
                "Skipping escalation of inactive ticket"
            );
            return Ok(EscalationOutcome::TicketInactive);
        }

        let team_id = ticket
            .team_id
            .ok_or(AutomationError::MissingEscalationTarget {
                ticket_id,
                team_id: None,
            })?;
        let team = self
            .directory
            .team(team_id)
            .await?
            .ok_or(AutomationError::TeamNotFound(team_id))?;

        let target_id = team
            .escalates_to
            .ok_or(AutomationError::MissingEscalationTarget {
                ticket_id,
                team_id: Some(team_id),
            })?;
        let target = self
            .directory
            .team(target_id)
            .await?
            .ok_or(AutomationError::TeamNotFound(target_id))?;

        if target.org_id != ticket.org_id {
            return Err(AutomationError::Validation(format!(
                "escalation target {} belongs to a different organization",
                target.name
            )));
        }

        ticket.team_id = Some(target.id);
        ticket.assignee_id = None;
        ticket.updated_at = Utc::now();
        self.tickets.update(&ticket).await?;

        self.tickets
            .append_event(
                TicketEvent::new(
                    ticket_id,
                    None,
                    TicketEventType::Escalated,
                    format!(
                        "Escalated from {} to {} ({reason})",
                        team.name, target.name
                    ),
                )
                .with_change(team.name.clone(), target.name.clone()),
            )
            .await?;

        self.scheduler
            .enqueue_now(JobPayload::SendNotification {
                kind: NotificationKind::Escalated,
                ticket_id,
                message: format!(
                    "Ticket {} was escalated from {} to {} ({reason}).",
                    ticket.code, team.name, target.name
                ),
                user_ids: None,
            })
            .await;

        tracing::warn!(
            ticket_id = %ticket_id,
            code = %ticket.code,
            from_team = %team.name,
            to_team = %target.name,
            reason = %reason,
            "Ticket escalated"
        );

        Ok(EscalationOutcome::Escalated {
            from_team: team.id,
            to_team: target.id,
        })
    }
}
