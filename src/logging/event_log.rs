//! Durable audit trail of collector events

use crate::config::FileNaming;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Second-granularity timestamp prefixed to every event line
pub const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%Hh%Mm%Ss";

/// Severity of a recorded event, used for console output only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    /// Routine operational event
    Info,
    /// Unexpected but handled condition
    Warn,
    /// Failed operation
    Error,
}

/// Appends timestamped event lines to a log file chosen once at creation.
///
/// Every event is also emitted through `tracing`. Failures to append are
/// reported on the console and otherwise ignored.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Create a log named after the current time using the given template
    pub fn create(naming: &FileNaming) -> Self {
        Self::at(naming.timestamped_path(Local::now()))
    }

    /// Create a log appending to an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file for this run
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an informational event
    pub fn info(&self, message: impl AsRef<str>) {
        self.record(EventLevel::Info, message.as_ref());
    }

    /// Record a warning
    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(EventLevel::Warn, message.as_ref());
    }

    /// Record an error
    pub fn error(&self, message: impl AsRef<str>) {
        self.record(EventLevel::Error, message.as_ref());
    }

    /// Emit the event on the console and append it to the log file
    pub fn record(&self, level: EventLevel, message: &str) {
        match level {
            EventLevel::Info => tracing::info!("{}", message),
            EventLevel::Warn => tracing::warn!("{}", message),
            EventLevel::Error => tracing::error!("{}", message),
        }

        let line = format!("{}: {}\n", Local::now().format(EVENT_TIMESTAMP_FORMAT), message);
        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), "Failed to append to event log: {}", e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_names_file_from_template() {
        let dir = tempdir().unwrap();
        let naming = FileNaming {
            title: "collector".to_string(),
            extension: "log".to_string(),
            directory: dir.path().to_path_buf(),
        };

        let log = EventLog::create(&naming);
        let name = log.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("collector-"));
        assert!(name.ends_with(".log"));
        assert!(naming.timestamp_part(name).is_some());
        assert!(!log.path().exists(), "file is created on first event");
    }

    #[test]
    fn appends_one_timestamped_line_per_event() {
        let dir = tempdir().unwrap();
        let log = EventLog::at(dir.path().join("events.log"));

        log.info("Listening for SMDR data");
        log.warn("unexpected peer");
        log.error("Socket error while receiving data");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(": Listening for SMDR data"));
        assert!(lines[2].contains("Socket error while receiving data"));
        // 2024-01-02-03h04m05s: ...
        assert_eq!(lines[0].find(": "), Some(20));
    }

    #[test]
    fn append_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        let log = EventLog::at(dir.path().join("missing/dir/events.log"));
        log.error("nowhere to go");
        assert!(!log.path().exists());
    }
}
