//! Storage traits for tickets and the directory.
//!
//! The automation core treats both stores as black-box collaborators with
//! synchronous request/response semantics. In-memory implementations live
//! in [`crate::memory`]; server deployments plug in their own.

use async_trait::async_trait;
use thiserror::Error;

use crate::directory::{Team, TeamMember, User};
use crate::event::TicketEvent;
use crate::ticket::{OrgId, TeamId, Ticket, TicketId, TicketStatus, UserId};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflicted with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend-specific failure (connection loss, timeout, ...).
    #[error("Backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }
}

/// Filters for listing tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Restrict to an organization
    pub org_id: Option<OrgId>,
    /// Restrict to a status
    pub status: Option<TicketStatus>,
    /// Restrict to a team
    pub team_id: Option<TeamId>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn org(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    pub fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Check a ticket against the filter.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(org_id) = self.org_id {
            if ticket.org_id != org_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(team_id) = self.team_id {
            if ticket.team_id != Some(team_id) {
                return false;
            }
        }
        true
    }
}

/// Ticket persistence.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Fetch a ticket by ID.
    async fn get(&self, id: TicketId) -> StoreResult<Option<Ticket>>;

    /// Insert a new ticket. Fails with `Conflict` if the ID already exists.
    async fn insert(&self, ticket: Ticket) -> StoreResult<()>;

    /// Replace an existing ticket record.
    async fn update(&self, ticket: &Ticket) -> StoreResult<()>;

    /// List tickets matching a filter.
    async fn list(&self, filter: TicketFilter) -> StoreResult<Vec<Ticket>>;

    /// Append an audit event.
    async fn append_event(&self, event: TicketEvent) -> StoreResult<()>;

    /// Fetch the audit log of a ticket, oldest first.
    async fn events_for(&self, id: TicketId) -> StoreResult<Vec<TicketEvent>>;
}

/// Read access to users, teams and memberships.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch a user by ID.
    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Fetch a team by ID.
    async fn team(&self, id: TeamId) -> StoreResult<Option<Team>>;

    /// List all teams of an organization.
    async fn teams_by_org(&self, org_id: OrgId) -> StoreResult<Vec<Team>>;

    /// List all memberships of a team.
    async fn members_by_team(&self, team_id: TeamId) -> StoreResult<Vec<TeamMember>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_filter_matches() {
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();
        let mut ticket = Ticket::new(org, "TCK-1", "Subject", Uuid::new_v4()).with_team(team);
        ticket.status = TicketStatus::Triage;

        assert!(TicketFilter::new().matches(&ticket));
        assert!(TicketFilter::new().org(org).matches(&ticket));
        assert!(TicketFilter::new()
            .org(org)
            .status(TicketStatus::Triage)
            .team(team)
            .matches(&ticket));
        assert!(!TicketFilter::new().org(Uuid::new_v4()).matches(&ticket));
        assert!(!TicketFilter::new()
            .status(TicketStatus::Closed)
            .matches(&ticket));
    }

    #[test]
    fn test_store_error_transient() {
        assert!(StoreError::Backend("connection reset".into()).is_transient());
        assert!(!StoreError::NotFound("ticket".into()).is_transient());
        assert!(!StoreError::Conflict("duplicate".into()).is_transient());
    }
}
