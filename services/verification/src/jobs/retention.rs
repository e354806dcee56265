//! Periodic retention sweep for verification records.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use registry_core::clock::{Clock, SystemClock};

use crate::domain::code::{CodeGenerator, SecureCodeGenerator};
use crate::domain::repository::VerificationRepository;
use crate::error::VerificationServiceError;
use crate::infra::db::DbVerificationRepository;
use crate::usecase::verification::VerificationRegistry;

/// Runs `purge_expired_records` on a fixed interval.
pub struct RetentionJob<R, G, C>
where
    R: VerificationRepository,
    G: CodeGenerator,
    C: Clock,
{
    pub registry: VerificationRegistry<R, G, C>,
    pub interval: Duration,
}

impl<R, G, C> RetentionJob<R, G, C>
where
    R: VerificationRepository,
    G: CodeGenerator,
    C: Clock,
{
    /// One sweep. Errors are logged and returned; the schedule keeps going.
    pub async fn run_once(&self) -> Result<u64, VerificationServiceError> {
        match self.registry.purge_expired_records().await {
            Ok(deleted) => Ok(deleted),
            Err(e) => {
                error!(error = ?e, "verification retention sweep failed");
                Err(e)
            }
        }
    }
}

/// Retention job over the Postgres-backed registry.
pub type DbRetentionJob = RetentionJob<DbVerificationRepository, SecureCodeGenerator, SystemClock>;

impl DbRetentionJob {
    /// Spawn the sweep loop. The first sweep runs immediately.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                "verification retention job started"
            );
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = self.run_once().await;
            }
        })
    }
}
