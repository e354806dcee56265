use std::time::Duration as StdDuration;

use chrono::Duration;

use registry_core::config::{env_or, require_env};

use crate::domain::types::{
    CODE_TTL_SECS, MAX_ATTEMPTS, MAX_POLICY_WINDOW_SECS, PolicyError, RECENT_WINDOW_SECS,
    RETENTION_SECS, VerificationPolicy,
};

/// Default interval between retention sweeps.
pub const PURGE_INTERVAL_SECS: u64 = 60 * 60;

/// Verification service configuration loaded from environment variables.
#[derive(Debug)]
pub struct VerificationConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3120). Env var: `VERIFICATION_PORT`.
    pub verification_port: u16,
    /// Code lifetime in seconds (default 600). Env var: `CODE_TTL_SECS`.
    pub code_ttl_secs: i64,
    /// Recently-verified lookback in seconds (default 1800). Env var: `RECENT_WINDOW_SECS`.
    pub recent_window_secs: i64,
    /// Record retention in seconds (default 86400). Env var: `RETENTION_SECS`.
    pub retention_secs: i64,
    /// Attempt ceiling per record (default 5). Env var: `MAX_ATTEMPTS`.
    pub max_attempts: i32,
    /// Seconds between retention sweeps (default 3600). Env var: `PURGE_INTERVAL_SECS`.
    pub purge_interval_secs: u64,
    /// Run the in-process retention sweep (default true). Env var: `RETENTION_JOB_ENABLED`.
    pub retention_job_enabled: bool,
}

impl VerificationConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: require_env("DATABASE_URL"),
            verification_port: env_or("VERIFICATION_PORT", 3120),
            code_ttl_secs: env_or("CODE_TTL_SECS", CODE_TTL_SECS),
            recent_window_secs: env_or("RECENT_WINDOW_SECS", RECENT_WINDOW_SECS),
            retention_secs: env_or("RETENTION_SECS", RETENTION_SECS),
            max_attempts: env_or("MAX_ATTEMPTS", MAX_ATTEMPTS),
            purge_interval_secs: env_or("PURGE_INTERVAL_SECS", PURGE_INTERVAL_SECS),
            retention_job_enabled: env_or("RETENTION_JOB_ENABLED", true),
        }
    }

    /// Policy built from the configured windows. Rejects non-positive or
    /// out-of-range values so the service refuses to start with them.
    pub fn policy(&self) -> Result<VerificationPolicy, PolicyError> {
        let policy = VerificationPolicy {
            code_ttl: window("CODE_TTL_SECS", self.code_ttl_secs)?,
            recent_window: window("RECENT_WINDOW_SECS", self.recent_window_secs)?,
            retention: window("RETENTION_SECS", self.retention_secs)?,
            max_attempts: self.max_attempts,
        };
        if policy.max_attempts <= 0 {
            return Err(PolicyError::NonPositive("MAX_ATTEMPTS"));
        }
        policy.validate()?;
        Ok(policy)
    }

    pub fn purge_interval(&self) -> StdDuration {
        // tokio::time::interval panics on a zero period.
        StdDuration::from_secs(self.purge_interval_secs.max(1))
    }
}

fn window(name: &'static str, secs: i64) -> Result<Duration, PolicyError> {
    if secs <= 0 {
        return Err(PolicyError::NonPositive(name));
    }
    if secs > MAX_POLICY_WINDOW_SECS {
        return Err(PolicyError::TooLong(name));
    }
    Ok(Duration::seconds(secs))
}
