//! Notification dispatcher.
//!
//! Resolves the recipient set for a notification kind and fans the message
//! out through every enabled channel. Send failures are caught and logged
//! per recipient; they never block the remaining recipients and never
//! propagate to the caller.

use std::sync::Arc;

use deskmind_core::{DirectoryStore, NotificationKind, Ticket, User, UserId};

use crate::channels::ChannelRegistry;
use crate::error::Result;
use crate::notification::Notification;

/// Counters from one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Recipients the policy resolved
    pub resolved: usize,
    /// Successful channel sends
    pub delivered: usize,
    /// Failed channel sends (logged, not propagated)
    pub failed: usize,
}

/// Resolves recipients and emits notifications through the channel registry.
pub struct NotificationDispatcher {
    directory: Arc<dyn DirectoryStore>,
    channels: Arc<ChannelRegistry>,
}

impl NotificationDispatcher {
    pub fn new(directory: Arc<dyn DirectoryStore>, channels: Arc<ChannelRegistry>) -> Self {
        Self {
            directory,
            channels,
        }
    }

    /// The channel registry backing this dispatcher.
    pub fn channels(&self) -> Arc<ChannelRegistry> {
        self.channels.clone()
    }

    /// Resolve recipients for `kind` against the ticket.
    ///
    /// An explicit user set overrides the per-kind policy. Inactive users
    /// are always filtered out.
    pub async fn resolve_recipients(
        &self,
        ticket: &Ticket,
        kind: NotificationKind,
        explicit: Option<&[UserId]>,
    ) -> Result<Vec<User>> {
        if let Some(ids) = explicit {
            let mut users = Vec::new();
            for id in ids {
                if let Some(user) = self.directory.user(*id).await? {
                    if user.active {
                        users.push(user);
                    }
                }
            }
            return Ok(users);
        }

        match kind {
            NotificationKind::TicketCreated | NotificationKind::TicketAssigned => {
                let mut users = Vec::new();
                if let Some(assignee_id) = ticket.assignee_id {
                    if let Some(user) = self.directory.user(assignee_id).await? {
                        if user.active {
                            users.push(user);
                        }
                    }
                }
                Ok(users)
            }
            NotificationKind::SlaBreach | NotificationKind::Escalated => {
                let mut users = Vec::new();
                if let Some(team_id) = ticket.team_id {
                    for member in self.directory.members_by_team(team_id).await? {
                        if !member.role.is_staff() {
                            continue;
                        }
                        if let Some(user) = self.directory.user(member.user_id).await? {
                            if user.active {
                                users.push(user);
                            }
                        }
                    }
                }
                Ok(users)
            }
            NotificationKind::CsatSurvey => {
                let mut users = Vec::new();
                if let Some(user) = self.directory.user(ticket.requester_id).await? {
                    if user.active {
                        users.push(user);
                    }
                }
                Ok(users)
            }
        }
    }

    /// Resolve recipients and send through every enabled channel.
    pub async fn dispatch(
        &self,
        ticket: &Ticket,
        notification: &Notification,
        explicit: Option<&[UserId]>,
    ) -> Result<DispatchReport> {
        let recipients = self
            .resolve_recipients(ticket, notification.kind, explicit)
            .await?;

        if recipients.is_empty() {
            // Configuration gap, not an error: e.g. a team with no staff
            // members, or an unassigned ticket.
            tracing::warn!(
                ticket_id = %ticket.id,
                kind = %notification.kind,
                "No recipients resolved for notification"
            );
            return Ok(DispatchReport::default());
        }

        let channels = self.channels.enabled().await;
        let mut report = DispatchReport {
            resolved: recipients.len(),
            ..DispatchReport::default()
        };

        for user in &recipients {
            for channel in &channels {
                match channel.send(&user.email, notification).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::error!(
                            ticket_id = %ticket.id,
                            recipient = %user.email,
                            channel = channel.name(),
                            error = %e,
                            "Notification send failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MemoryChannel;
    use deskmind_core::{MemoryDirectory, Team, TeamMember, TeamRole, TicketPriority, User};
    use uuid::Uuid;

    struct Fixture {
        dispatcher: NotificationDispatcher,
        memory: Arc<MemoryChannel>,
        directory: MemoryDirectory,
    }

    async fn fixture() -> Fixture {
        let directory = MemoryDirectory::new();
        let channels = Arc::new(ChannelRegistry::new());
        let memory = Arc::new(MemoryChannel::new("mem".to_string()));
        channels.register(memory.clone()).await;
        let dispatcher = NotificationDispatcher::new(Arc::new(directory.clone()), channels);
        Fixture {
            dispatcher,
            memory,
            directory,
        }
    }

    fn ticket() -> Ticket {
        Ticket::new(Uuid::new_v4(), "TCK-1", "Broken build", Uuid::new_v4())
            .with_priority(TicketPriority::P2)
    }

    fn notification(kind: NotificationKind, ticket: &Ticket) -> Notification {
        Notification::new(kind, ticket.id, ticket.code.clone(), "Subject", "Body")
    }

    #[tokio::test]
    async fn test_assigned_goes_to_assignee_only() {
        let f = fixture().await;
        let assignee = Uuid::new_v4();
        f.directory
            .add_user(User::new(assignee, "Agent", "agent@example.com"))
            .await;

        let ticket = ticket().with_assignee(assignee);
        let n = notification(NotificationKind::TicketAssigned, &ticket);

        let report = f.dispatcher.dispatch(&ticket, &n, None).await.unwrap();
        assert_eq!(report.resolved, 1);
        assert_eq!(report.delivered, 1);

        let deliveries = f.memory.deliveries().await;
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].to, "agent@example.com");
    }

    #[tokio::test]
    async fn test_sla_breach_goes_to_team_staff() {
        let f = fixture().await;
        let org = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        f.directory.add_team(Team::new(team_id, org, "L1")).await;

        let admin = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let requester_member = Uuid::new_v4();
        f.directory
            .add_user(User::new(admin, "Admin", "admin@example.com"))
            .await;
        f.directory
            .add_user(User::new(agent, "Agent", "agent@example.com"))
            .await;
        f.directory
            .add_user(User::new(requester_member, "Req", "req@example.com"))
            .await;
        f.directory
            .add_member(TeamMember::new(team_id, admin, TeamRole::Admin))
            .await;
        f.directory
            .add_member(TeamMember::new(team_id, agent, TeamRole::Agent))
            .await;
        f.directory
            .add_member(TeamMember::new(team_id, requester_member, TeamRole::Requester))
            .await;

        let ticket = ticket().with_team(team_id);
        let n = notification(NotificationKind::SlaBreach, &ticket);

        let report = f.dispatcher.dispatch(&ticket, &n, None).await.unwrap();
        assert_eq!(report.resolved, 2);

        let recipients: Vec<String> = f
            .memory
            .deliveries()
            .await
            .into_iter()
            .map(|d| d.to)
            .collect();
        assert!(recipients.contains(&"admin@example.com".to_string()));
        assert!(recipients.contains(&"agent@example.com".to_string()));
        assert!(!recipients.contains(&"req@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_explicit_set_overrides_policy() {
        let f = fixture().await;
        let explicit_user = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        f.directory
            .add_user(User::new(explicit_user, "Ops", "ops@example.com"))
            .await;
        f.directory
            .add_user(User::new(assignee, "Agent", "agent@example.com"))
            .await;

        let ticket = ticket().with_assignee(assignee);
        let n = notification(NotificationKind::TicketAssigned, &ticket);

        let report = f
            .dispatcher
            .dispatch(&ticket, &n, Some(&[explicit_user]))
            .await
            .unwrap();
        assert_eq!(report.resolved, 1);
        assert_eq!(f.memory.deliveries().await[0].to, "ops@example.com");
    }

    #[tokio::test]
    async fn test_inactive_users_filtered() {
        let f = fixture().await;
        let assignee = Uuid::new_v4();
        f.directory
            .add_user(User::new(assignee, "Gone", "gone@example.com").deactivated())
            .await;

        let ticket = ticket().with_assignee(assignee);
        let n = notification(NotificationKind::TicketAssigned, &ticket);

        let report = f.dispatcher.dispatch(&ticket, &n, None).await.unwrap();
        assert_eq!(report, DispatchReport::default());
        assert_eq!(f.memory.count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_recipients_is_not_an_error() {
        let f = fixture().await;
        let ticket = ticket(); // no assignee, no team
        let n = notification(NotificationKind::SlaBreach, &ticket);

        let report = f.dispatcher.dispatch(&ticket, &n, None).await.unwrap();
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_block_other_recipients() {
        let directory = MemoryDirectory::new();
        let channels = Arc::new(ChannelRegistry::new());
        let failing = Arc::new(MemoryChannel::failing("bad".to_string(), "smtp down"));
        let working = Arc::new(MemoryChannel::new("good".to_string()));
        channels.register(failing).await;
        channels.register(working.clone()).await;
        let dispatcher = NotificationDispatcher::new(Arc::new(directory.clone()), channels);

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        directory.add_user(User::new(a, "A", "a@example.com")).await;
        directory.add_user(User::new(b, "B", "b@example.com")).await;

        let ticket = ticket();
        let n = notification(NotificationKind::TicketCreated, &ticket);

        let report = dispatcher
            .dispatch(&ticket, &n, Some(&[a, b]))
            .await
            .unwrap();
        assert_eq!(report.resolved, 2);
        assert_eq!(report.delivered, 2); // both via the working channel
        assert_eq!(report.failed, 2); // both via the failing channel
        assert_eq!(working.count().await, 2);
    }

    #[tokio::test]
    async fn test_csat_goes_to_requester() {
        let f = fixture().await;
        let requester = Uuid::new_v4();
        f.directory
            .add_user(User::new(requester, "Customer", "customer@example.com"))
            .await;

        let mut ticket = ticket();
        ticket.requester_id = requester;
        let n = notification(NotificationKind::CsatSurvey, &ticket);

        let report = f.dispatcher.dispatch(&ticket, &n, None).await.unwrap();
        assert_eq!(report.resolved, 1);
        assert_eq!(f.memory.deliveries().await[0].to, "customer@example.com");
    }
}
