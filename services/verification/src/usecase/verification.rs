use anyhow::{Context as _, anyhow};
use tracing::{debug, info};

use registry_core::clock::{Clock, SystemClock};

use crate::domain::code::{CodeGenerator, SecureCodeGenerator, is_well_formed};
use crate::domain::repository::VerificationRepository;
use crate::domain::types::{
    OutboxEvent, RecordState, VerificationPolicy, VerificationRecord, VerifyOutcome,
};
use crate::error::VerificationServiceError;

fn normalize_email(email: &str) -> Result<String, VerificationServiceError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(VerificationServiceError::MissingEmail);
    }
    Ok(email.to_lowercase())
}

fn normalize_code(code: &str) -> Result<&str, VerificationServiceError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(VerificationServiceError::MissingCode);
    }
    Ok(code)
}

/// Issues, checks and retires email verification codes.
///
/// Emails are trimmed and lowercased before they reach the store, so
/// `Bride@Example.com` and `bride@example.com` share one code history.
pub struct VerificationRegistry<R, G = SecureCodeGenerator, C = SystemClock>
where
    R: VerificationRepository,
    G: CodeGenerator,
    C: Clock,
{
    pub records: R,
    pub generator: G,
    pub clock: C,
    pub policy: VerificationPolicy,
}

impl<R, G, C> VerificationRegistry<R, G, C>
where
    R: VerificationRepository,
    G: CodeGenerator,
    C: Clock,
{
    /// Issue a new code for `email`, superseding any active one.
    ///
    /// Returns the plaintext code; delivery happens through the outbox event
    /// written alongside the record.
    pub async fn issue_code(&self, email: &str) -> Result<String, VerificationServiceError> {
        let email = normalize_email(email)?;
        let code = self.generator.generate();
        let record =
            VerificationRecord::issue(email, code, self.clock.now(), self.policy.code_ttl)
                .ok_or_else(|| anyhow!("code expiry out of range"))?;
        let event = OutboxEvent::code_issued(&record);

        let invalidated = self.records.replace_active(&record, &event).await?;

        info!(record_id = %record.id, invalidated, "verification code issued");
        Ok(record.code)
    }

    /// Check `code` against the active record for `email` and consume it on
    /// success.
    ///
    /// `attempts` only moves on the success path, together with `verified`.
    /// A wrong code matches no record and leaves every row untouched, so the
    /// ceiling is only reachable through records written elsewhere.
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifyOutcome, VerificationServiceError> {
        let email = normalize_email(email)?;
        let code = normalize_code(code)?;

        // No issued code has any other shape.
        if !is_well_formed(code) {
            debug!("malformed verification code");
            return Ok(VerifyOutcome::InvalidCode);
        }

        let Some(record) = self.records.find_latest_active(&email, code).await? else {
            debug!("no active record matches");
            return Ok(VerifyOutcome::InvalidCode);
        };

        match record.state(self.clock.now(), self.policy.max_attempts) {
            RecordState::Active => {}
            RecordState::Expired => {
                debug!(record_id = %record.id, "verification code expired");
                return Ok(VerifyOutcome::Expired);
            }
            RecordState::Locked => {
                debug!(
                    record_id = %record.id,
                    attempts = record.attempts,
                    "attempt ceiling reached"
                );
                return Ok(VerifyOutcome::TooManyAttempts);
            }
            RecordState::Consumed => {
                debug!(record_id = %record.id, "verification code already consumed");
                return Ok(VerifyOutcome::InvalidCode);
            }
        }

        if !self
            .records
            .consume(record.id, self.policy.max_attempts)
            .await?
        {
            // Consumed or superseded between the lookup and the update.
            debug!(record_id = %record.id, "lost race consuming verification code");
            return Ok(VerifyOutcome::InvalidCode);
        }

        info!(record_id = %record.id, "verification code consumed");
        Ok(VerifyOutcome::Verified)
    }

    /// Whether `email` has a consumed code issued within the recent window.
    ///
    /// The window is anchored on issuance, not on when verification happened.
    pub async fn is_recently_verified(&self, email: &str) -> Result<bool, VerificationServiceError> {
        let email = normalize_email(email)?;
        let since = self
            .clock
            .now()
            .checked_sub_signed(self.policy.recent_window)
            .ok_or_else(|| anyhow!("recent window out of range"))?;
        self.records.exists_verified_since(&email, since).await
    }

    /// Delete records older than the retention period, whatever their state.
    /// Returns how many were removed.
    /// Fails without deleting anything if the policy is invalid.
    pub async fn purge_expired_records(&self) -> Result<u64, VerificationServiceError> {
        self.policy
            .validate()
            .context("refusing to purge with invalid policy")?;
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(self.policy.retention)
            .ok_or_else(|| anyhow!("retention cutoff out of range"))?;
        let deleted = self.records.delete_created_before(cutoff).await?;
        info!(deleted, %cutoff, "purged verification records");
        Ok(deleted)
    }
}
