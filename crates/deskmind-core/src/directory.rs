//! User and team directory records.
//!
//! The directory is an external collaborator of the automation core; these
//! types are the read-side records it serves.

use serde::{Deserialize, Serialize};

use crate::ticket::{OrgId, TeamId, UserId};

/// Role of a user inside a team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Team administrator
    Admin,
    /// Support agent
    Agent,
    /// End user
    Requester,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Admin => "admin",
            TeamRole::Agent => "agent",
            TeamRole::Requester => "requester",
        }
    }

    /// Check if the role should receive operational alerts for the team.
    pub fn is_staff(&self) -> bool {
        matches!(self, TeamRole::Admin | TeamRole::Agent)
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directory user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: UserId,
    /// Display name
    pub display_name: String,
    /// Contact email address
    pub email: String,
    /// Whether the account is active
    pub active: bool,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            active: true,
        }
    }

    /// Mark the user as deactivated.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A support team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique team ID
    pub id: TeamId,
    /// Owning organization
    pub org_id: OrgId,
    /// Display name
    pub name: String,
    /// Next tier in the escalation chain, if any
    pub escalates_to: Option<TeamId>,
}

impl Team {
    pub fn new(id: TeamId, org_id: OrgId, name: impl Into<String>) -> Self {
        Self {
            id,
            org_id,
            name: name.into(),
            escalates_to: None,
        }
    }

    /// Link this team to the next escalation tier.
    pub fn with_escalation_target(mut self, target: TeamId) -> Self {
        self.escalates_to = Some(target);
        self
    }
}

/// Membership of a user in a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Team the membership belongs to
    pub team_id: TeamId,
    /// Member user ID
    pub user_id: UserId,
    /// Role inside the team
    pub role: TeamRole,
}

impl TeamMember {
    pub fn new(team_id: TeamId, user_id: UserId, role: TeamRole) -> Self {
        Self {
            team_id,
            user_id,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_role_is_staff() {
        assert!(TeamRole::Admin.is_staff());
        assert!(TeamRole::Agent.is_staff());
        assert!(!TeamRole::Requester.is_staff());
    }

    #[test]
    fn test_team_escalation_link() {
        let org = Uuid::new_v4();
        let tier2 = Uuid::new_v4();
        let team = Team::new(Uuid::new_v4(), org, "Support L1").with_escalation_target(tier2);
        assert_eq!(team.escalates_to, Some(tier2));
    }

    #[test]
    fn test_deactivated_user() {
        let user = User::new(Uuid::new_v4(), "Sam", "sam@example.com").deactivated();
        assert!(!user.active);
    }
}
