//! Test utilities for registry services.
//!
//! Import from `[dev-dependencies]` only, never from production code.

pub mod clock;
