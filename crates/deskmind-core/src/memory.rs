//! In-memory store implementations.
//!
//! Used by tests and single-process embedders. State lives behind
//! `Arc<RwLock<..>>` so clones share the same backing maps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::{Team, TeamMember, User};
use crate::event::TicketEvent;
use crate::store::{DirectoryStore, StoreError, StoreResult, TicketFilter, TicketStore};
use crate::ticket::{OrgId, TeamId, Ticket, TicketId, UserId};

/// In-memory ticket store.
#[derive(Clone, Default)]
pub struct MemoryTicketStore {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    events: Arc<RwLock<Vec<TicketEvent>>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored tickets.
    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn get(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn insert(&self, ticket: Ticket) -> StoreResult<()> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket.id) {
            return Err(StoreError::Conflict(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        tickets.insert(ticket.id, ticket);
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut tickets = self.tickets.write().await;
        match tickets.get_mut(&ticket.id) {
            Some(existing) => {
                *existing = ticket.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("ticket {}", ticket.id))),
        }
    }

    async fn list(&self, filter: TicketFilter) -> StoreResult<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut matched: Vec<Ticket> = tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matched.sort_by_key(|t| t.created_at);
        Ok(matched)
    }

    async fn append_event(&self, event: TicketEvent) -> StoreResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events_for(&self, id: TicketId) -> StoreResult<Vec<TicketEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.ticket_id == id)
            .cloned()
            .collect())
    }
}

/// In-memory user/team directory.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    teams: Arc<RwLock<HashMap<TeamId, Team>>>,
    members: Arc<RwLock<Vec<TeamMember>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Add or replace a team.
    pub async fn add_team(&self, team: Team) {
        self.teams.write().await.insert(team.id, team);
    }

    /// Add a membership.
    pub async fn add_member(&self, member: TeamMember) {
        self.members.write().await.push(member);
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.teams.read().await.get(&id).cloned())
    }

    async fn teams_by_org(&self, org_id: OrgId) -> StoreResult<Vec<Team>> {
        let teams = self.teams.read().await;
        let mut matched: Vec<Team> = teams
            .values()
            .filter(|t| t.org_id == org_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn members_by_team(&self, team_id: TeamId) -> StoreResult<Vec<TeamMember>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::TeamRole;
    use crate::event::TicketEventType;
    use crate::ticket::TicketStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_insert_get_update() {
        let store = MemoryTicketStore::new();
        let ticket = Ticket::new(Uuid::new_v4(), "TCK-1", "Subject", Uuid::new_v4());
        let id = ticket.id;

        store.insert(ticket.clone()).await.unwrap();
        assert!(store.get(id).await.unwrap().is_some());

        // Duplicate insert conflicts
        assert!(matches!(
            store.insert(ticket.clone()).await,
            Err(StoreError::Conflict(_))
        ));

        let mut updated = ticket;
        updated.status = TicketStatus::Triage;
        store.update(&updated).await.unwrap();
        assert_eq!(
            store.get(id).await.unwrap().unwrap().status,
            TicketStatus::Triage
        );
    }

    #[tokio::test]
    async fn test_update_missing_ticket() {
        let store = MemoryTicketStore::new();
        let ticket = Ticket::new(Uuid::new_v4(), "TCK-1", "Subject", Uuid::new_v4());
        assert!(matches!(
            store.update(&ticket).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let store = MemoryTicketStore::new();
        let org = Uuid::new_v4();

        for i in 0..3 {
            store
                .insert(Ticket::new(org, format!("TCK-{i}"), "Subject", Uuid::new_v4()))
                .await
                .unwrap();
        }
        store
            .insert(Ticket::new(Uuid::new_v4(), "TCK-X", "Other org", Uuid::new_v4()))
            .await
            .unwrap();

        let listed = store.list(TicketFilter::new().org(org)).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn test_event_log() {
        let store = MemoryTicketStore::new();
        let ticket_id = TicketId::new();

        store
            .append_event(TicketEvent::new(
                ticket_id,
                None,
                TicketEventType::Created,
                "Created",
            ))
            .await
            .unwrap();
        store
            .append_event(TicketEvent::new(
                ticket_id,
                None,
                TicketEventType::StatusChanged,
                "new -> triage",
            ))
            .await
            .unwrap();

        let events = store.events_for(ticket_id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, TicketEventType::Created);
    }

    #[tokio::test]
    async fn test_directory_lookup() {
        let dir = MemoryDirectory::new();
        let org = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        dir.add_team(Team::new(team_id, org, "Support L1")).await;
        dir.add_user(User::new(user_id, "Sam", "sam@example.com")).await;
        dir.add_member(TeamMember::new(team_id, user_id, TeamRole::Agent))
            .await;

        assert!(dir.team(team_id).await.unwrap().is_some());
        assert_eq!(dir.teams_by_org(org).await.unwrap().len(), 1);
        assert_eq!(dir.members_by_team(team_id).await.unwrap().len(), 1);
        assert!(dir.user(user_id).await.unwrap().unwrap().active);
    }
}
