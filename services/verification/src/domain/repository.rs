#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{OutboxEvent, VerificationRecord};
use crate::error::VerificationServiceError;

/// Persistent store of verification records.
///
/// Implementations take every timestamp as an argument; reading the clock is
/// the caller's job.
pub trait VerificationRepository: Send + Sync {
    /// Mark every active record for `record.email` as verified, then insert
    /// `record` and `event`, all in one transaction. Returns how many
    /// records were invalidated.
    async fn replace_active(
        &self,
        record: &VerificationRecord,
        event: &OutboxEvent,
    ) -> Result<u64, VerificationServiceError>;

    /// Most recently created active record matching `email` and `code`.
    async fn find_latest_active(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationRecord>, VerificationServiceError>;

    /// Atomically set `verified = true` and increment `attempts`, but only
    /// while the record is still active and below `max_attempts`.
    /// Returns `false` if another writer got there first.
    async fn consume(&self, id: Uuid, max_attempts: i32)
    -> Result<bool, VerificationServiceError>;

    /// Whether any verified record for `email` was created at or after `since`.
    async fn exists_verified_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, VerificationServiceError>;

    /// Delete every record created before `cutoff`. Returns rows removed.
    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, VerificationServiceError>;
}
