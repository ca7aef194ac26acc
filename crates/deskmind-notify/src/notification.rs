//! Notification types.

use chrono::{DateTime, Utc};
use deskmind_core::{NotificationKind, TicketId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How urgent a notification is for the recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action required
    #[default]
    Info = 0,
    /// Something needs attention soon
    Warning = 1,
    /// Action required now
    Critical = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// The default severity for a notification kind.
    pub fn for_kind(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::SlaBreach => Severity::Critical,
            NotificationKind::Escalated => Severity::Warning,
            NotificationKind::TicketCreated
            | NotificationKind::TicketAssigned
            | NotificationKind::CsatSurvey => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification about a ticket, ready for recipient resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// Category; drives recipient resolution
    pub kind: NotificationKind,
    /// Ticket the notification is about
    pub ticket_id: TicketId,
    /// Human-readable ticket code for message bodies
    pub ticket_code: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: String,
    /// Urgency
    pub severity: Severity,
    /// When the notification was produced
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification with the default severity for its kind.
    pub fn new(
        kind: NotificationKind,
        ticket_id: TicketId,
        ticket_code: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ticket_id,
            ticket_code: ticket_code.into(),
            subject: subject.into(),
            body: body.into(),
            severity: Severity::for_kind(kind),
            created_at: Utc::now(),
        }
    }

    /// Override the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
