//! SMDR collector server implementation

pub mod connection;
pub mod rotation;
pub mod shutdown;
pub mod storage;

use crate::config::CollectorConfig;
use crate::logging::EventLog;
use crate::{Result, SmdrError};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

pub use connection::{Connection, ConnectionEnd, IngestOutcome, RecordPipeline};
pub use rotation::RotationPolicy;
pub use shutdown::ShutdownSignals;
pub use storage::RecordWriter;

const LISTEN_BACKLOG: u32 = 5;

/// Owns the listening socket and serves one exchange connection at a time
/// until shutdown is requested.
pub struct SmdrServer {
    config: CollectorConfig,
    listener: TcpListener,
    events: EventLog,
    pipeline: RecordPipeline,
}

impl SmdrServer {
    /// Bind the listening socket with address reuse enabled
    pub async fn bind(config: CollectorConfig, events: EventLog) -> Result<Self> {
        config.validate()?;

        let bind_addr = config.bind_addr();
        let addr = tokio::net::lookup_host(&bind_addr)
            .await
            .map_err(|e| SmdrError::Server(format!("Failed to resolve {}: {}", bind_addr, e)))?
            .next()
            .ok_or_else(|| SmdrError::Server(format!("No address found for {}", bind_addr)))?;

        let listener = Self::listen(addr).map_err(|e| {
            SmdrError::Server(format!("Failed to bind {}: {}", bind_addr, e))
        })?;

        events.info(format!(
            "Listening for SMDR data on {}...",
            listener.local_addr()?
        ));

        let pipeline = RecordPipeline::new(&config, events.clone());
        Ok(Self {
            config,
            listener,
            events,
            pipeline,
        })
    }

    fn listen(addr: SocketAddr) -> std::io::Result<TcpListener> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(LISTEN_BACKLOG)
    }

    /// Address the listening socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The record pipeline, mainly to inspect the active output file
    pub fn pipeline(&self) -> &RecordPipeline {
        &self.pipeline
    }

    /// Accept and serve connections until `shutdown` is cancelled.
    ///
    /// Per-connection and per-record failures are logged and never end the
    /// loop. The listening socket is closed before returning.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let Self {
            config,
            listener,
            events,
            mut pipeline,
        } = self;
        let poll_interval = config.network.poll_interval();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = timeout(poll_interval, listener.accept()) => accepted,
            };

            let (stream, peer) = match accepted {
                // poll interval elapsed, re-check shutdown
                Err(_) => continue,
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => {
                    if !shutdown.is_cancelled() {
                        events.error(format!("Error accepting connections: {}", e));
                    }
                    continue;
                }
            };

            events.info(format!("Connection established with {}", peer));
            if let Some(expected) = config.network.pbx_address.as_deref() {
                if peer.ip().to_string() != expected {
                    events.warn(format!(
                        "Connection from {} does not match the configured PBX address {}",
                        peer, expected
                    ));
                }
            }

            let end = Connection::new(stream, peer.to_string(), &config.network)
                .serve(&mut pipeline, &shutdown)
                .await;
            tracing::debug!(%peer, ?end, "connection finished");
        }

        drop(listener);
        events.info("SMDR collector shutdown completed");
        Ok(())
    }
}
