//! Error types for the ticket workflow.

use deskmind_core::{TicketPriority, TicketStatus};
use thiserror::Error;

use crate::transitions::TransitionGuard;

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that can occur validating transitions or resolving SLA rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The requested transition is not in the table.
    #[error("invalid transition {from} -> {to}; valid targets from {from}: {}", format_statuses(.valid))]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
        valid: Vec<TicketStatus>,
    },

    /// The transition exists but its guard evaluated false.
    #[error("transition {from} -> {to} rejected by guard {guard}; valid targets from {from}: {}", format_statuses(.valid))]
    GuardRejected {
        from: TicketStatus,
        to: TicketStatus,
        guard: TransitionGuard,
        valid: Vec<TicketStatus>,
    },

    /// No SLA rule is configured for a priority.
    #[error("no SLA rule configured for priority {0}")]
    MissingSlaRule(TicketPriority),

    /// The SLA table does not cover every priority.
    #[error("SLA table incomplete: missing {}", format_priorities(.0))]
    IncompleteSlaTable(Vec<TicketPriority>),
}

impl WorkflowError {
    /// The valid destinations carried by a rejection, if any.
    pub fn valid_targets(&self) -> Option<&[TicketStatus]> {
        match self {
            WorkflowError::InvalidTransition { valid, .. }
            | WorkflowError::GuardRejected { valid, .. } => Some(valid),
            _ => None,
        }
    }
}

fn format_statuses(statuses: &[TicketStatus]) -> String {
    statuses
        .iter()
        .map(TicketStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_priorities(priorities: &[TicketPriority]) -> String {
    priorities
        .iter()
        .map(TicketPriority::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
