//! # SMDR Collector
//!
//! A long-running collector for Station Message Detail Recording (SMDR) data.
//! It accepts a single TCP stream from a telephone exchange, validates each
//! record it receives and appends valid records to a rotating set of CSV
//! files, while keeping an audit trail of operational events in a log file.
//!
//! ## Features
//!
//! - **Single-peer ingestion**: one exchange connection at a time, served in arrival order
//! - **Structural validation**: records must carry exactly 38 comma-separated fields
//! - **Rotation**: time and size based rollover of the CSV output file
//! - **Locked appends**: exclusive advisory lock around every row write
//! - **Graceful shutdown**: SIGTERM / Ctrl-C close sockets and log the cleanup
//!
//! ## Quick Start
//!
//! ```no_run
//! use smdr_collector::config::CollectorConfig;
//! use smdr_collector::logging::EventLog;
//! use smdr_collector::server::SmdrServer;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollectorConfig::from_file("config/collector.toml")?;
//!     config.prepare_directories()?;
//!     let event_log = EventLog::create(&config.log_file);
//!     let server = SmdrServer::bind(config, event_log).await?;
//!     server.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod logging;
pub mod server;
pub mod types;

/// Common error types used throughout the collector
pub mod error {
    use std::fmt;

    /// Collector error types
    #[derive(Debug)]
    pub enum SmdrError {
        /// I/O operation failed
        Io(std::io::Error),
        /// Configuration error
        Config(String),
        /// Server error
        Server(String),
        /// Record could not be written
        Record(String),
    }

    impl fmt::Display for SmdrError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                SmdrError::Io(e) => write!(f, "I/O error: {}", e),
                SmdrError::Config(e) => write!(f, "Configuration error: {}", e),
                SmdrError::Server(e) => write!(f, "Server error: {}", e),
                SmdrError::Record(e) => write!(f, "Record error: {}", e),
            }
        }
    }

    impl std::error::Error for SmdrError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                SmdrError::Io(e) => Some(e),
                _ => None,
            }
        }
    }

    impl From<std::io::Error> for SmdrError {
        fn from(err: std::io::Error) -> Self {
            SmdrError::Io(err)
        }
    }

    impl From<csv::Error> for SmdrError {
        fn from(err: csv::Error) -> Self {
            SmdrError::Record(err.to_string())
        }
    }

    /// Result type alias for collector operations
    pub type Result<T> = std::result::Result<T, SmdrError>;
}

pub use error::{Result, SmdrError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::CollectorConfig;
    pub use crate::logging::EventLog;
    pub use crate::server::{RecordWriter, RotationPolicy, SmdrServer};
    pub use crate::types::{SmdrRecord, Validation};
    pub use crate::{Result, SmdrError};
}
