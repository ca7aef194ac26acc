//! Ticket data structures.
//!
//! Defines the core record types for the ticket lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier.
pub type UserId = Uuid;

/// Team identifier.
pub type TeamId = Uuid;

/// Organization identifier.
pub type OrgId = Uuid;

/// Ticket priority levels. Lower number = more urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    /// Highest urgency - outage-level incidents
    P1 = 1,
    /// High urgency
    P2 = 2,
    /// Normal urgency
    #[default]
    P3 = 3,
    /// Low urgency
    P4 = 4,
    /// Lowest urgency - backlog work
    P5 = 5,
}

impl TicketPriority {
    /// Get the numeric priority value.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Get priority from numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(TicketPriority::P1),
            2 => Some(TicketPriority::P2),
            3 => Some(TicketPriority::P3),
            4 => Some(TicketPriority::P4),
            5 => Some(TicketPriority::P5),
            _ => None,
        }
    }

    /// All priorities in ascending numeric order.
    pub fn all() -> [TicketPriority; 5] {
        [
            TicketPriority::P1,
            TicketPriority::P2,
            TicketPriority::P3,
            TicketPriority::P4,
            TicketPriority::P5,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::P1 => "p1",
            TicketPriority::P2 => "p2",
            TicketPriority::P3 => "p3",
            TicketPriority::P4 => "p4",
            TicketPriority::P5 => "p5",
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Just created, not yet triaged
    #[default]
    New,
    /// Under triage
    Triage,
    /// Being worked on by an assignee
    InProgress,
    /// Waiting on the customer
    WaitingCustomer,
    /// Waiting on an approval decision
    WaitingApproval,
    /// Parked
    OnHold,
    /// Work finished, pending confirmation
    Resolved,
    /// Confirmed done
    Closed,
    /// Abandoned
    Canceled,
}

impl TicketStatus {
    /// Check if the status is a terminal state.
    ///
    /// Closed and Resolved still permit a reopen transition; Canceled
    /// does not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed | TicketStatus::Canceled)
    }

    /// Check if the ticket still counts against its SLA deadline.
    pub fn is_open(&self) -> bool {
        !matches!(
            self,
            TicketStatus::Resolved | TicketStatus::Closed | TicketStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Triage => "triage",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::WaitingCustomer => "waiting_customer",
            TicketStatus::WaitingApproval => "waiting_approval",
            TicketStatus::OnHold => "on_hold",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
            TicketStatus::Canceled => "canceled",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TicketStatus::New),
            "triage" => Some(TicketStatus::Triage),
            "in_progress" => Some(TicketStatus::InProgress),
            "waiting_customer" => Some(TicketStatus::WaitingCustomer),
            "waiting_approval" => Some(TicketStatus::WaitingApproval),
            "on_hold" => Some(TicketStatus::OnHold),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            "canceled" => Some(TicketStatus::Canceled),
            _ => None,
        }
    }

    /// All statuses.
    pub fn all() -> [TicketStatus; 9] {
        [
            TicketStatus::New,
            TicketStatus::Triage,
            TicketStatus::InProgress,
            TicketStatus::WaitingCustomer,
            TicketStatus::WaitingApproval,
            TicketStatus::OnHold,
            TicketStatus::Resolved,
            TicketStatus::Closed,
            TicketStatus::Canceled,
        ]
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval decision state for tickets that require approval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Decision not yet made
    Pending,
    /// Request approved
    Approved,
    /// Request rejected
    Rejected,
}

/// Why a ticket was escalated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Escalated because the SLA deadline was breached
    SlaBreach,
    /// Escalated manually by an operator
    Manual,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::SlaBreach => "sla_breach",
            EscalationReason::Manual => "manual",
        }
    }
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification categories understood by the dispatcher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A ticket was created
    TicketCreated,
    /// A ticket was assigned to an agent
    TicketAssigned,
    /// A ticket blew past its SLA deadline
    SlaBreach,
    /// A ticket was moved to the next escalation tier
    Escalated,
    /// A satisfaction survey for a resolved ticket
    CsatSurvey,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TicketCreated => "ticket_created",
            NotificationKind::TicketAssigned => "ticket_assigned",
            NotificationKind::SlaBreach => "sla_breach",
            NotificationKind::Escalated => "escalated",
            NotificationKind::CsatSurvey => "csat_survey",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket ID
    pub id: TicketId,
    /// Human-readable ticket code (e.g. "TCK-1024")
    pub code: String,
    /// Owning organization
    pub org_id: OrgId,
    /// Short summary
    pub subject: String,
    /// Free-form description
    pub description: Option<String>,
    /// Current workflow status
    pub status: TicketStatus,
    /// Priority (drives the SLA deadline)
    pub priority: TicketPriority,
    /// User who opened the ticket
    pub requester_id: UserId,
    /// Agent currently responsible, if any
    pub assignee_id: Option<UserId>,
    /// Team currently responsible, if any
    pub team_id: Option<TeamId>,
    /// Whether this ticket must pass an approval gate
    pub requires_approval: bool,
    /// Approval decision, if an approval flow was started
    pub approval_status: Option<ApprovalStatus>,
    /// Active SLA resolution deadline
    pub due_at: Option<DateTime<Utc>>,
    /// First-response deadline
    pub first_response_due: Option<DateTime<Utc>>,
    /// When an agent first responded
    pub first_response_at: Option<DateTime<Utc>>,
    /// When the ticket entered Resolved
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the ticket entered Closed
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket in the initial status.
    pub fn new(
        org_id: OrgId,
        code: impl Into<String>,
        subject: impl Into<String>,
        requester_id: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TicketId::new(),
            code: code.into(),
            org_id,
            subject: subject.into(),
            description: None,
            status: TicketStatus::New,
            priority: TicketPriority::default(),
            requester_id,
            assignee_id: None,
            team_id: None,
            requires_approval: false,
            approval_status: None,
            due_at: None,
            first_response_due: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the owning team.
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Set the assignee.
    pub fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Mark the ticket as requiring approval.
    pub fn with_approval_required(mut self) -> Self {
        self.requires_approval = true;
        self.approval_status = Some(ApprovalStatus::Pending);
        self
    }

    /// Check if the ticket currently has an assignee.
    pub fn has_assignee(&self) -> bool {
        self.assignee_id.is_some()
    }

    /// Check if SLA breach evaluation is still meaningful for this ticket.
    pub fn sla_active(&self) -> bool {
        self.status.is_open() && self.resolved_at.is_none()
    }
}
