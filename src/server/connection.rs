//! Per-connection receive loop and record dispatch

use crate::config::{CollectorConfig, NetworkSettings};
use crate::logging::EventLog;
use crate::server::{RecordWriter, RotationPolicy};
use crate::types::{validate, Validation};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// What happened to one received payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The record was appended to the given file
    Written(PathBuf),
    /// The payload failed structural validation
    Rejected,
    /// The record was valid but could not be written
    WriteFailed,
}

/// Validation, rotation and writing of received payloads.
///
/// Owns the active output file reference, which only the rotation policy
/// changes.
#[derive(Debug)]
pub struct RecordPipeline {
    rotation: RotationPolicy,
    writer: RecordWriter,
    events: EventLog,
    active_output: PathBuf,
}

impl RecordPipeline {
    /// Create a pipeline targeting a freshly named output file
    pub fn new(config: &CollectorConfig, events: EventLog) -> Self {
        let rotation = RotationPolicy::new(
            config.output_file.clone(),
            config.rotation.clone(),
            events.clone(),
        );
        let active_output = rotation.fresh_path();
        Self {
            rotation,
            writer: RecordWriter::new(events.clone()),
            events,
            active_output,
        }
    }

    /// Continue writing to an existing output file instead of a fresh one
    pub fn with_active_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.active_output = path.into();
        self
    }

    /// File the next valid record is checked against
    pub fn active_output(&self) -> &Path {
        &self.active_output
    }

    /// Validate one decoded payload and append it if it is a valid record
    pub fn ingest(&mut self, payload: &str) -> IngestOutcome {
        let record = match validate(payload) {
            Validation::Valid(record) => record,
            Validation::Invalid { field_count } => {
                self.events.warn(format!(
                    "Erroneous data received ({} fields): \n{}",
                    field_count, payload
                ));
                return IngestOutcome::Rejected;
            }
        };

        self.active_output = self.rotation.next_path(&self.active_output);
        match self.writer.append(&self.active_output, &record) {
            Ok(()) => IngestOutcome::Written(self.active_output.clone()),
            Err(_) => {
                self.events.error(format!(
                    "Did not successfully write data to SMDR records: {:?}",
                    record.fields()
                ));
                IngestOutcome::WriteFailed
            }
        }
    }
}

/// Why a connection's receive loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The peer closed the stream
    PeerClosed,
    /// Shutdown was requested
    Shutdown,
    /// A socket error ended the loop
    Failed,
}

/// One accepted exchange connection
pub struct Connection<S> {
    stream: S,
    peer: String,
    buffer: Vec<u8>,
    poll_interval: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an accepted stream
    pub fn new(stream: S, peer: impl Into<String>, network: &NetworkSettings) -> Self {
        Self {
            stream,
            peer: peer.into(),
            buffer: vec![0; network.buffer_size],
            poll_interval: network.poll_interval(),
        }
    }

    /// Receive and dispatch payloads until the peer closes, a socket error
    /// occurs or `shutdown` is cancelled.
    ///
    /// Each read is treated as exactly one record.
    pub async fn serve(
        mut self,
        pipeline: &mut RecordPipeline,
        shutdown: &CancellationToken,
    ) -> ConnectionEnd {
        let events = pipeline.events.clone();

        let end = loop {
            if shutdown.is_cancelled() {
                break ConnectionEnd::Shutdown;
            }

            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break ConnectionEnd::Shutdown,
                read = timeout(self.poll_interval, self.stream.read(&mut self.buffer)) => read,
            };

            match read {
                // poll interval elapsed, re-check shutdown
                Err(_) => continue,
                Ok(Ok(0)) => {
                    events.info(format!("Connection closed by {}", self.peer));
                    break ConnectionEnd::PeerClosed;
                }
                Ok(Ok(n)) => match std::str::from_utf8(&self.buffer[..n]) {
                    Ok(payload) => {
                        pipeline.ingest(payload);
                    }
                    Err(e) => {
                        events.warn(format!(
                            "Failed to decode received data ({} bytes): {}",
                            n, e
                        ));
                    }
                },
                Ok(Err(e)) => {
                    if !shutdown.is_cancelled() {
                        events.error(format!("Socket error while receiving data: {}", e));
                    }
                    break ConnectionEnd::Failed;
                }
            }
        };

        if end == ConnectionEnd::Shutdown {
            if let Err(e) = self.stream.shutdown().await {
                events.warn(format!("Error closing active client {}: {}", self.peer, e));
            }
        }
        end
    }
}
