//! Configuration management for the collector

pub mod settings;

pub use settings::{
    CollectorConfig, FileNaming, NetworkSettings, RotationSettings, FILE_TIMESTAMP_FORMAT,
};
