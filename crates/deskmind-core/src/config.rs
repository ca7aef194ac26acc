//! Shared configuration defaults and environment overrides.
//!
//! Single home for the timing knobs used across the workspace so the
//! scheduler, breach monitor and survey scheduler agree on defaults.

/// Built-in defaults for the automation core.
pub mod defaults {
    /// Scheduler tick period in seconds.
    pub const TICK_INTERVAL_SECS: u64 = 30;
    /// How long before the SLA deadline the early breach check runs, in minutes.
    pub const BREACH_LEAD_MINUTES: i64 = 60;
    /// Delay between resolution and the CSAT survey, in minutes.
    pub const CSAT_DELAY_MINUTES: i64 = 30;
    /// Retention window for completed jobs, in minutes.
    pub const JOB_RETENTION_MINUTES: i64 = 60;
    /// Maximum execution attempts per job before dead-lettering.
    pub const MAX_JOB_ATTEMPTS: u32 = 3;
}

/// Environment variable names and parse-or-default helpers.
pub mod env_vars {
    use super::defaults;

    pub const TICK_INTERVAL_SECS: &str = "DESKMIND_TICK_INTERVAL_SECS";
    pub const BREACH_LEAD_MINUTES: &str = "DESKMIND_BREACH_LEAD_MINUTES";
    pub const CSAT_DELAY_MINUTES: &str = "DESKMIND_CSAT_DELAY_MINUTES";
    pub const JOB_RETENTION_MINUTES: &str = "DESKMIND_JOB_RETENTION_MINUTES";
    pub const MAX_JOB_ATTEMPTS: &str = "DESKMIND_MAX_JOB_ATTEMPTS";

    fn parse_or<T: std::str::FromStr>(var: &str, default: T) -> T {
        std::env::var(var)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Scheduler tick period from the environment, or the default.
    pub fn tick_interval_secs() -> u64 {
        parse_or(TICK_INTERVAL_SECS, defaults::TICK_INTERVAL_SECS)
    }

    /// Breach check lead time from the environment, or the default.
    pub fn breach_lead_minutes() -> i64 {
        parse_or(BREACH_LEAD_MINUTES, defaults::BREACH_LEAD_MINUTES)
    }

    /// CSAT survey delay from the environment, or the default.
    pub fn csat_delay_minutes() -> i64 {
        parse_or(CSAT_DELAY_MINUTES, defaults::CSAT_DELAY_MINUTES)
    }

    /// Completed-job retention window from the environment, or the default.
    pub fn job_retention_minutes() -> i64 {
        parse_or(JOB_RETENTION_MINUTES, defaults::JOB_RETENTION_MINUTES)
    }

    /// Maximum job attempts from the environment, or the default.
    pub fn max_job_attempts() -> u32 {
        parse_or(MAX_JOB_ATTEMPTS, defaults::MAX_JOB_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        assert_eq!(defaults::TICK_INTERVAL_SECS, 30);
        assert_eq!(defaults::BREACH_LEAD_MINUTES, 60);
        assert_eq!(defaults::CSAT_DELAY_MINUTES, 30);
        assert_eq!(defaults::JOB_RETENTION_MINUTES, 60);
        assert!(defaults::MAX_JOB_ATTEMPTS >= 1);
    }

    #[test]
    fn test_env_fallback() {
        // Unset vars fall back to defaults.
        assert_eq!(env_vars::tick_interval_secs(), defaults::TICK_INTERVAL_SECS);
        assert_eq!(env_vars::max_job_attempts(), defaults::MAX_JOB_ATTEMPTS);
    }
}
