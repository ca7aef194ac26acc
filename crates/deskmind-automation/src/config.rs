//! Automation configuration.

use deskmind_core::config::{defaults, env_vars};
use serde::{Deserialize, Serialize};

/// What happens to `due_at` when a ticket's priority changes after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DueDatePolicy {
    /// Recompute the deadline from `created_at` with the new priority.
    #[default]
    Recompute,
    /// Keep the deadline computed at creation.
    Freeze,
}

/// Configuration for the automation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// How long before the SLA deadline the early breach check runs, in minutes
    pub breach_lead_minutes: i64,
    /// Delay between resolution and the CSAT survey, in minutes
    pub csat_delay_minutes: i64,
    /// Deadline policy for post-creation priority changes
    pub due_date_policy: DueDatePolicy,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            breach_lead_minutes: defaults::BREACH_LEAD_MINUTES,
            csat_delay_minutes: defaults::CSAT_DELAY_MINUTES,
            due_date_policy: DueDatePolicy::default(),
        }
    }
}

impl AutomationConfig {
    /// Build the configuration from environment overrides.
    pub fn from_env() -> Self {
        Self {
            breach_lead_minutes: env_vars::breach_lead_minutes(),
            csat_delay_minutes: env_vars::csat_delay_minutes(),
            due_date_policy: DueDatePolicy::default(),
        }
    }

    /// Set the due date policy.
    pub fn with_due_date_policy(mut self, policy: DueDatePolicy) -> Self {
        self.due_date_policy = policy;
        self
    }
}
