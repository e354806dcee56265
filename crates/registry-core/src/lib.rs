pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod tracing;
