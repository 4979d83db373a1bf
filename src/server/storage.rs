//! Locked CSV appends for SMDR records

use crate::logging::EventLog;
use crate::types::SmdrRecord;
use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Appends one CSV row per record to the active output file.
///
/// The file is opened, exclusively locked, written and closed for every
/// record, so no handle outlives a single append.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    events: EventLog,
}

impl RecordWriter {
    /// Create a writer that reports failures to the given event log
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }

    /// Append `record` as one row of `path`, creating the file if needed.
    ///
    /// Failures are logged before being returned.
    pub fn append(&self, path: &Path, record: &SmdrRecord) -> Result<()> {
        let result = Self::append_locked(path, record);
        if let Err(e) = &result {
            self.events.error(format!(
                "Error writing records file {}: {}",
                path.display(),
                e
            ));
        }
        result
    }

    fn append_locked(path: &Path, record: &SmdrRecord) -> Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        FileExt::lock_exclusive(&file)?;

        let written = Self::write_row(&file, record);
        let unlocked = FileExt::unlock(&file);

        written?;
        unlocked?;
        Ok(())
    }

    fn write_row(file: &File, record: &SmdrRecord) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer.write_record(record.fields())?;
        writer.flush()?;
        Ok(())
    }
}
