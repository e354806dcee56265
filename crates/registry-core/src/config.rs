//! Helpers for loading service configuration from environment variables.
//!
//! Services build their config struct in a `from_env()` constructor using
//! these helpers. Missing required variables abort startup.

use std::str::FromStr;

/// Read a required variable.
///
/// # Panics
///
/// Panics if the variable is unset or not valid unicode.
pub fn require_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

/// Read an optional variable, parsing it as `T`. Unset or unparsable values
/// fall back to `default`.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
