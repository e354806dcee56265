use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use registry_testing::clock::ManualClock;
use registry_verification::domain::code::CodeGenerator;
use registry_verification::domain::repository::VerificationRepository;
use registry_verification::domain::types::{
    CODE_TTL_SECS, OutboxEvent, VerificationPolicy, VerificationRecord,
};
use registry_verification::error::VerificationServiceError;
use registry_verification::usecase::verification::VerificationRegistry;

// ── InMemoryVerificationRepo ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryVerificationRepo {
    pub records: Arc<Mutex<Vec<VerificationRecord>>>,
    pub events: Arc<Mutex<Vec<OutboxEvent>>>,
    /// Makes the next `consume` behave as if another writer won the race.
    pub lose_next_consume: Arc<AtomicBool>,
    /// Makes every call fail like an unreachable database.
    pub unavailable: Arc<AtomicBool>,
}

impl InMemoryVerificationRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: VerificationRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn snapshot(&self) -> Vec<VerificationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn for_email(&self, email: &str) -> Vec<VerificationRecord> {
        self.snapshot()
            .into_iter()
            .filter(|r| r.email == email)
            .collect()
    }

    pub fn active_for(&self, email: &str) -> Vec<VerificationRecord> {
        self.for_email(email)
            .into_iter()
            .filter(|r| !r.verified)
            .collect()
    }

    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut VerificationRecord)) {
        let mut records = self.records.lock().unwrap();
        let record = records.iter_mut().find(|r| r.id == id).unwrap();
        f(record);
    }

    fn check_available(&self) -> Result<(), VerificationServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("database unavailable").into());
        }
        Ok(())
    }
}

impl VerificationRepository for InMemoryVerificationRepo {
    async fn replace_active(
        &self,
        record: &VerificationRecord,
        event: &OutboxEvent,
    ) -> Result<u64, VerificationServiceError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let mut invalidated = 0;
        for r in records
            .iter_mut()
            .filter(|r| r.email == record.email && !r.verified)
        {
            r.verified = true;
            invalidated += 1;
        }
        records.push(record.clone());
        self.events.lock().unwrap().push(event.clone());
        Ok(invalidated)
    }

    async fn find_latest_active(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationRecord>, VerificationServiceError> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.email == email && r.code == code && !r.verified)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn consume(
        &self,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<bool, VerificationServiceError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if self.lose_next_consume.swap(false, Ordering::SeqCst) {
            record.verified = true;
            return Ok(false);
        }
        if record.verified || record.attempts >= max_attempts {
            return Ok(false);
        }
        record.verified = true;
        record.attempts += 1;
        Ok(true)
    }

    async fn exists_verified_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, VerificationServiceError> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.email == email && r.verified && r.created_at >= since))
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, VerificationServiceError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

// ── ScriptedCodeGenerator ────────────────────────────────────────────────────

/// Hands out a fixed sequence of codes.
pub struct ScriptedCodeGenerator {
    codes: Mutex<VecDeque<String>>,
}

impl ScriptedCodeGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| (*c).to_owned()).collect()),
        }
    }
}

impl CodeGenerator for ScriptedCodeGenerator {
    fn generate(&self) -> String {
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted generator ran out of codes")
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub const BRIDE: &str = "bride@example.com";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 20, 15, 0, 0).unwrap()
}

pub type TestRegistry =
    VerificationRegistry<InMemoryVerificationRepo, ScriptedCodeGenerator, ManualClock>;

/// Registry over fresh in-memory state. The returned repo and clock share
/// state with the registry.
pub fn registry(codes: &[&str]) -> (TestRegistry, InMemoryVerificationRepo, ManualClock) {
    let repo = InMemoryVerificationRepo::new();
    let clock = ManualClock::new(start_time());
    let registry = VerificationRegistry {
        records: repo.clone(),
        generator: ScriptedCodeGenerator::new(codes),
        clock: clock.clone(),
        policy: VerificationPolicy::default(),
    };
    (registry, repo, clock)
}

/// Record issued `age` before `start_time()`.
pub fn record_aged(email: &str, code: &str, age: Duration, verified: bool) -> VerificationRecord {
    let mut record = VerificationRecord::issue(
        email.to_owned(),
        code.to_owned(),
        start_time() - age,
        Duration::seconds(CODE_TTL_SECS),
    )
    .unwrap();
    record.verified = verified;
    record
}
