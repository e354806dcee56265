//! Time source abstraction.
//!
//! Use cases read "now" through [`Clock`] instead of calling `Utc::now()`
//! directly so expiry windows can be exercised in tests without sleeping.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
