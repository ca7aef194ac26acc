//! Error types for the automation layer.

use deskmind_core::{StoreError, TeamId, TicketId};
use thiserror::Error;

/// Result type for automation operations.
pub type Result<T> = std::result::Result<T, AutomationError>;

/// Errors that can occur driving the ticket lifecycle.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// Referenced ticket no longer exists.
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    /// Referenced team no longer exists.
    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    /// The ticket's team has no next escalation tier configured.
    #[error("no escalation target configured for ticket {ticket_id} (team {team_id:?})")]
    MissingEscalationTarget {
        ticket_id: TicketId,
        team_id: Option<TeamId>,
    },

    /// Survey token does not exist.
    #[error("survey {0} not found")]
    SurveyNotFound(String),

    /// A response was already recorded for the survey.
    #[error("survey {0} already has a response")]
    SurveyAlreadySubmitted(String),

    /// Survey score outside the accepted range.
    #[error("invalid survey score {0}: must be between 1 and 5")]
    InvalidSurveyScore(u8),

    /// Rejected status transition or SLA table problem.
    #[error(transparent)]
    Workflow(#[from] deskmind_workflow::WorkflowError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Notification dispatch failure.
    #[error("Notification failure: {0}")]
    Notify(#[from] deskmind_notify::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AutomationError {
    /// Check if a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AutomationError::Store(e) => e.is_transient(),
            AutomationError::Notify(deskmind_notify::Error::Store(e)) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AutomationError::Store(StoreError::Backend("timeout".into())).is_transient());
        assert!(!AutomationError::Store(StoreError::NotFound("ticket".into())).is_transient());
        assert!(!AutomationError::TicketNotFound(TicketId::new()).is_transient());
        assert!(!AutomationError::InvalidSurveyScore(9).is_transient());
    }
}
