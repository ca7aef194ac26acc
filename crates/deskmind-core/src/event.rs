//! Append-only ticket audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ticket::{TicketId, UserId};

/// Category of an audit event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketEventType {
    /// Ticket created
    Created,
    /// Accepted status transition
    StatusChanged,
    /// Assignee changed
    Assigned,
    /// Owning team changed
    TeamChanged,
    /// Priority changed
    PriorityChanged,
    /// Moved to the next escalation tier
    Escalated,
    /// SLA deadline breached
    SlaBreached,
    /// First agent response recorded
    FirstResponseRecorded,
    /// Satisfaction survey dispatched
    SurveySent,
}

impl TicketEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketEventType::Created => "created",
            TicketEventType::StatusChanged => "status_changed",
            TicketEventType::Assigned => "assigned",
            TicketEventType::TeamChanged => "team_changed",
            TicketEventType::PriorityChanged => "priority_changed",
            TicketEventType::Escalated => "escalated",
            TicketEventType::SlaBreached => "sla_breached",
            TicketEventType::FirstResponseRecorded => "first_response_recorded",
            TicketEventType::SurveySent => "survey_sent",
        }
    }
}

impl std::fmt::Display for TicketEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a ticket's audit log.
///
/// Events are append-only. An accepted status change produces exactly one
/// `StatusChanged` event; rejected transitions produce none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    /// Unique event ID
    pub id: Uuid,
    /// Ticket the event belongs to
    pub ticket_id: TicketId,
    /// Acting user; None means the system acted
    pub actor_id: Option<UserId>,
    /// Event category
    pub event_type: TicketEventType,
    /// Value before the change, if applicable
    pub old_value: Option<String>,
    /// Value after the change, if applicable
    pub new_value: Option<String>,
    /// Human-readable summary
    pub description: String,
    /// When the event happened
    pub created_at: DateTime<Utc>,
}

impl TicketEvent {
    /// Create a new event.
    pub fn new(
        ticket_id: TicketId,
        actor_id: Option<UserId>,
        event_type: TicketEventType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            actor_id,
            event_type,
            old_value: None,
            new_value: None,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Attach the before/after values.
    pub fn with_change(
        mut self,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        self.old_value = Some(old_value.into());
        self.new_value = Some(new_value.into());
        self
    }

    /// Check whether the event was system-initiated.
    pub fn is_system(&self) -> bool {
        self.actor_id.is_none()
    }
}
