//! The ticket state machine.
//!
//! A static table of legal status transitions with guard conditions and
//! the declarative side-effects the caller must apply atomically with the
//! status write. Pure functions, no I/O; nothing here mutates a ticket.

use deskmind_core::{ApprovalStatus, Ticket, TicketStatus};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// Guard conditions a transition may require.
///
/// A closed enum: an unknown guard cannot be expressed, so there is no
/// silent default for unrecognized condition names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransitionGuard {
    /// Ticket is flagged as requiring approval
    RequiresApproval,
    /// Ticket has an assignee
    HasAssignee,
    /// Approval decision is Approved
    ApprovalGranted,
    /// Approval decision is Rejected
    ApprovalRejected,
}

impl TransitionGuard {
    /// Evaluate the guard against a transition context.
    pub fn evaluate(&self, ctx: &TransitionContext) -> bool {
        match self {
            TransitionGuard::RequiresApproval => ctx.requires_approval,
            TransitionGuard::HasAssignee => ctx.has_assignee,
            TransitionGuard::ApprovalGranted => ctx.approval_status == Some(ApprovalStatus::Approved),
            TransitionGuard::ApprovalRejected => ctx.approval_status == Some(ApprovalStatus::Rejected),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionGuard::RequiresApproval => "requires_approval",
            TransitionGuard::HasAssignee => "has_assignee",
            TransitionGuard::ApprovalGranted => "approval_granted",
            TransitionGuard::ApprovalRejected => "approval_rejected",
        }
    }
}

impl std::fmt::Display for TransitionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declarative side-effects a transition requires.
///
/// The caller (the lifecycle service) applies these together with the
/// status write; the state machine itself never mutates anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// Stamp `resolved_at` with the transition time
    SetResolvedAt,
    /// Stamp `closed_at` with the transition time
    SetClosedAt,
    /// Clear `resolved_at` (reopen) so SLA evaluation resumes
    ClearResolvedAt,
}

/// The guard inputs for a transition, extracted from the ticket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionContext {
    pub requires_approval: bool,
    pub has_assignee: bool,
    pub approval_status: Option<ApprovalStatus>,
}

impl From<&Ticket> for TransitionContext {
    fn from(ticket: &Ticket) -> Self {
        Self {
            requires_approval: ticket.requires_approval,
            has_assignee: ticket.has_assignee(),
            approval_status: ticket.approval_status,
        }
    }
}

/// One legal edge in the state machine.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub guard: Option<TransitionGuard>,
    pub actions: &'static [TransitionAction],
}

use self::TransitionAction::*;
use self::TransitionGuard::*;
use deskmind_core::TicketStatus::*;

const fn edge(from: TicketStatus, to: TicketStatus) -> Transition {
    Transition {
        from,
        to,
        guard: None,
        actions: &[],
    }
}

const fn guarded(from: TicketStatus, to: TicketStatus, guard: TransitionGuard) -> Transition {
    Transition {
        from,
        to,
        guard: Some(guard),
        actions: &[],
    }
}

const fn with_actions(
    from: TicketStatus,
    to: TicketStatus,
    actions: &'static [TransitionAction],
) -> Transition {
    Transition {
        from,
        to,
        guard: None,
        actions,
    }
}

/// The full transition table.
pub const TRANSITIONS: &[Transition] = &[
    edge(New, Triage),
    guarded(New, WaitingApproval, RequiresApproval),
    edge(New, Canceled),
    guarded(Triage, InProgress, HasAssignee),
    guarded(Triage, WaitingApproval, RequiresApproval),
    edge(Triage, Canceled),
    edge(InProgress, WaitingCustomer),
    edge(InProgress, OnHold),
    edge(InProgress, Canceled),
    with_actions(InProgress, Resolved, &[SetResolvedAt]),
    edge(WaitingCustomer, InProgress),
    with_actions(WaitingCustomer, Closed, &[SetClosedAt]),
    guarded(WaitingApproval, InProgress, ApprovalGranted),
    guarded(WaitingApproval, Canceled, ApprovalRejected),
    edge(OnHold, InProgress),
    edge(OnHold, Canceled),
    with_actions(Resolved, Closed, &[SetClosedAt]),
    with_actions(Resolved, InProgress, &[ClearResolvedAt]),
    with_actions(Closed, InProgress, &[ClearResolvedAt]),
];

/// All legal destinations from a status, ignoring guards.
///
/// Intended for UI enablement: the set is what *could* be reachable, the
/// guard decides at submission time.
pub fn valid_transitions(from: TicketStatus) -> Vec<TicketStatus> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == from)
        .map(|t| t.to)
        .collect()
}

/// Validate a transition against the table and the guard context.
///
/// Returns the matching table entry on success so the caller can read its
/// required actions. Rejections carry the enumerated valid destinations.
pub fn validate_transition(
    from: TicketStatus,
    to: TicketStatus,
    ctx: &TransitionContext,
) -> Result<&'static Transition> {
    let transition = TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.to == to)
        .ok_or_else(|| WorkflowError::InvalidTransition {
            from,
            to,
            valid: valid_transitions(from),
        })?;

    if let Some(guard) = transition.guard {
        if !guard.evaluate(ctx) {
            return Err(WorkflowError::GuardRejected {
                from,
                to,
                guard,
                valid: valid_transitions(from),
            });
        }
    }

    Ok(transition)
}

/// The declarative side-effects required by a transition, if it is legal.
pub fn transition_actions(from: TicketStatus, to: TicketStatus) -> &'static [TransitionAction] {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.to == to)
        .map(|t| t.actions)
        .unwrap_or(&[])
}
