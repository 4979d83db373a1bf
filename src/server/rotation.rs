//! Time and size based rollover of the SMDR output file

use crate::config::{FileNaming, RotationSettings, FILE_TIMESTAMP_FORMAT};
use crate::logging::EventLog;
use chrono::{DateTime, Local, NaiveDateTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Decides before every write whether the active output file is kept or replaced.
///
/// Every inspection failure keeps the current path, so rotation can be
/// delayed but ingestion is never blocked.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    naming: FileNaming,
    settings: RotationSettings,
    events: EventLog,
}

impl RotationPolicy {
    /// Create a rotation policy for the given output naming and limits
    pub fn new(naming: FileNaming, settings: RotationSettings, events: EventLog) -> Self {
        Self {
            naming,
            settings,
            events,
        }
    }

    /// Path for an output file created now
    pub fn fresh_path(&self) -> PathBuf {
        self.naming.timestamped_path(Local::now())
    }

    /// Apply the time check, then the size check against its result
    pub fn next_path(&self, current: &Path) -> PathBuf {
        let now = Local::now();
        let after_time = self.check_time(current, now);
        self.check_size(&after_time, now)
    }

    /// Roll over when the timestamp embedded in the file name is at least
    /// `interval_hours` older than `now`.
    pub fn check_time(&self, current: &Path, now: DateTime<Local>) -> PathBuf {
        let file_name = current
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        let Some(stamp) = self.naming.timestamp_part(file_name) else {
            self.events.error(format!(
                "Could not extract timestamp from file name: {}",
                file_name
            ));
            return current.to_path_buf();
        };

        let created = match NaiveDateTime::parse_from_str(stamp, FILE_TIMESTAMP_FORMAT) {
            Ok(created) => created,
            Err(e) => {
                self.events
                    .error(format!("Error checking rollover time for {}: {}", file_name, e));
                return current.to_path_buf();
            }
        };

        let age = now.naive_local() - created;
        if age.num_milliseconds() as f64 >= self.settings.interval_hours * MILLIS_PER_HOUR {
            let next = self.naming.timestamped_path(now);
            self.events.info(format!(
                "The SMDR log has been rolled over. The new file is: {}",
                next.display()
            ));
            next
        } else {
            current.to_path_buf()
        }
    }

    /// Roll over when the file exists and has reached `max_size_mb`.
    pub fn check_size(&self, current: &Path, now: DateTime<Local>) -> PathBuf {
        let metadata = match std::fs::metadata(current) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return current.to_path_buf(),
            Err(e) => {
                self.events.error(format!(
                    "Error checking file size of {}: {}",
                    current.display(),
                    e
                ));
                return current.to_path_buf();
            }
        };

        let size_mb = metadata.len() as f64 / BYTES_PER_MB;
        if size_mb >= self.settings.max_size_mb {
            let next = self.naming.timestamped_path(now);
            self.events.info(format!(
                "SMDR records file was rolled over as it exceeded the maximum size of {} MB. The new file is: {}",
                self.settings.max_size_mb,
                next.display()
            ));
            next
        } else {
            current.to_path_buf()
        }
    }
}
