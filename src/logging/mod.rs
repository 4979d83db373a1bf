//! Operational event logging

pub mod event_log;

pub use event_log::{EventLevel, EventLog, EVENT_TIMESTAMP_FORMAT};
