pub mod outbox_events;
pub mod verification_records;
