use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lifetime of an issued code.
pub const CODE_TTL_SECS: i64 = 10 * 60;

/// Window during which a consumed code counts as "recently verified",
/// measured from the code's issuance.
pub const RECENT_WINDOW_SECS: i64 = 30 * 60;

/// Age after which records are deleted whatever their state.
pub const RETENTION_SECS: i64 = 24 * 60 * 60;

/// Attempt ceiling; a record at or above it can never be verified.
pub const MAX_ATTEMPTS: i32 = 5;

/// Upper bound for any configured policy window (ten years).
pub const MAX_POLICY_WINDOW_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Outbox event kind emitted for every issued code.
pub const VERIFICATION_CODE_ISSUED: &str = "verification_code_issued";

/// One issued email verification code.
///
/// `verified` is `false` while the code is active and flips to `true` once
/// it is consumed, either by a successful verification or because a newer
/// code was issued for the same email. It never flips back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Fresh active record issued at `now`. `None` if `now + ttl` is out of
    /// the representable range.
    pub fn issue(
        email: String,
        code: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            email,
            code,
            verified: false,
            attempts: 0,
            created_at: now,
            expires_at: now.checked_add_signed(ttl)?,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_locked(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }

    /// Derived lifecycle state. Only `verified` and `attempts` are stored;
    /// expiry and lock are computed against `now` and the policy, in the
    /// same order verification checks them.
    pub fn state(&self, now: DateTime<Utc>, max_attempts: i32) -> RecordState {
        if self.verified {
            RecordState::Consumed
        } else if self.is_expired(now) {
            RecordState::Expired
        } else if self.is_locked(max_attempts) {
            RecordState::Locked
        } else {
            RecordState::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Active,
    Expired,
    Locked,
    Consumed,
}

/// Result of presenting a code. Failures are routine and returned as values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// No active record matched. Covers wrong, consumed and superseded codes alike.
    InvalidCode,
    Expired,
    TooManyAttempts,
}

impl VerifyOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Verified => "OK",
            Self::InvalidCode => "INVALID_CODE",
            Self::Expired => "EXPIRED",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
        }
    }
}

/// Time windows and limits governing the code lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub code_ttl: Duration,
    pub recent_window: Duration,
    pub retention: Duration,
    pub max_attempts: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("{0} must not exceed ten years")]
    TooLong(&'static str),
}

impl VerificationPolicy {
    /// Every window positive and at most [`MAX_POLICY_WINDOW_SECS`], at
    /// least one attempt allowed.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let max = Duration::seconds(MAX_POLICY_WINDOW_SECS);
        for (name, window) in [
            ("code_ttl", self.code_ttl),
            ("recent_window", self.recent_window),
            ("retention", self.retention),
        ] {
            if window <= Duration::zero() {
                return Err(PolicyError::NonPositive(name));
            }
            if window > max {
                return Err(PolicyError::TooLong(name));
            }
        }
        if self.max_attempts <= 0 {
            return Err(PolicyError::NonPositive("max_attempts"));
        }
        Ok(())
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::seconds(CODE_TTL_SECS),
            recent_window: Duration::seconds(RECENT_WINDOW_SECS),
            retention: Duration::seconds(RETENTION_SECS),
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

/// Outbox event for async delivery of the code by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

impl OutboxEvent {
    pub fn code_issued(record: &VerificationRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_id: record.id,
            kind: VERIFICATION_CODE_ISSUED.to_owned(),
            payload: serde_json::json!({ "email": record.email, "code": record.code }),
            idempotency_key: format!("{VERIFICATION_CODE_ISSUED}:{}", record.id),
        }
    }
}
