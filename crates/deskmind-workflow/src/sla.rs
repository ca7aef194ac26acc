//! SLA policy resolution.
//!
//! Maps a ticket priority to first-response and resolution durations and
//! computes concrete due timestamps. Wall-clock arithmetic; business-hour
//! calendars are out of scope.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use deskmind_core::TicketPriority;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// SLA durations for one priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaRule {
    /// Priority the rule applies to
    pub priority: TicketPriority,
    /// Minutes allowed until first response
    pub first_response_minutes: i64,
    /// Minutes allowed until resolution
    pub resolution_minutes: i64,
}

impl SlaRule {
    pub fn new(
        priority: TicketPriority,
        first_response_minutes: i64,
        resolution_minutes: i64,
    ) -> Self {
        Self {
            priority,
            first_response_minutes,
            resolution_minutes,
        }
    }
}

/// The per-priority SLA table for an organization.
///
/// The table must cover every priority; a priority with no matching rule
/// is a configuration error, not a silent default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaPolicy {
    rules: HashMap<TicketPriority, SlaRule>,
}

impl SlaPolicy {
    /// Build a policy from a rule set. Fails unless all five priorities
    /// are covered.
    pub fn new(rules: Vec<SlaRule>) -> Result<Self> {
        let map: HashMap<TicketPriority, SlaRule> =
            rules.into_iter().map(|r| (r.priority, r)).collect();
        let missing: Vec<TicketPriority> = TicketPriority::all()
            .into_iter()
            .filter(|p| !map.contains_key(p))
            .collect();
        if !missing.is_empty() {
            return Err(WorkflowError::IncompleteSlaTable(missing));
        }
        Ok(Self { rules: map })
    }

    /// Look up the rule for a priority.
    pub fn rule(&self, priority: TicketPriority) -> Result<&SlaRule> {
        self.rules
            .get(&priority)
            .ok_or(WorkflowError::MissingSlaRule(priority))
    }

    /// Resolution deadline for a ticket created at `created_at`.
    pub fn resolution_due(
        &self,
        priority: TicketPriority,
        created_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let rule = self.rule(priority)?;
        Ok(created_at + Duration::minutes(rule.resolution_minutes))
    }

    /// First-response deadline for a ticket created at `created_at`.
    pub fn first_response_due(
        &self,
        priority: TicketPriority,
        created_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let rule = self.rule(priority)?;
        Ok(created_at + Duration::minutes(rule.first_response_minutes))
    }
}

impl Default for SlaPolicy {
    /// The stock table: P1 4h, P2 8h, P3 2d, P4 5d, P5 10d to resolution.
    fn default() -> Self {
        Self::new(vec![
            SlaRule::new(TicketPriority::P1, 30, 240),
            SlaRule::new(TicketPriority::P2, 60, 480),
            SlaRule::new(TicketPriority::P3, 240, 2880),
            SlaRule::new(TicketPriority::P4, 480, 7200),
            SlaRule::new(TicketPriority::P5, 960, 14400),
        ])
        .unwrap()
    }
}
