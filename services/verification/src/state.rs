use std::sync::Arc;

use sea_orm::DatabaseConnection;

use registry_core::clock::SystemClock;

use crate::domain::code::SecureCodeGenerator;
use crate::domain::types::VerificationPolicy;
use crate::infra::db::DbVerificationRepository;
use crate::usecase::verification::VerificationRegistry;

/// Registry wired to Postgres, the OS-seeded generator and the wall clock.
pub type DbVerificationRegistry =
    VerificationRegistry<DbVerificationRepository, SecureCodeGenerator, SystemClock>;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub policy: VerificationPolicy,
}

impl AppState {
    pub fn verification_repo(&self) -> DbVerificationRepository {
        DbVerificationRepository {
            db: Arc::clone(&self.db),
        }
    }

    pub fn registry(&self) -> DbVerificationRegistry {
        VerificationRegistry {
            records: self.verification_repo(),
            generator: SecureCodeGenerator,
            clock: SystemClock,
            policy: self.policy,
        }
    }
}
