//! Record types shared across the collector

pub mod record;

pub use record::{validate, SmdrRecord, Validation, SMDR_FIELD_COUNT};
