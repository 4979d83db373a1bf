//! Termination signal handling

use crate::logging::EventLog;
use std::future::Future;
use std::io;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Installed termination signal listeners.
///
/// On SIGTERM or Ctrl-C the shutdown is logged and the token is cancelled,
/// which closes the active connection and the listening socket within one
/// poll interval.
pub struct ShutdownSignals {
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignals {
    /// Register the signal handlers; must be called inside a tokio runtime
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for a termination signal, then request shutdown
    pub async fn cancel_on_signal(mut self, events: EventLog, shutdown: CancellationToken) {
        tokio::select! {
            _ = self.recv_terminate() => {}
            _ = delivered(tokio::signal::ctrl_c(), "Ctrl-C") => {}
            _ = shutdown.cancelled() => return,
        }

        events.info("Received shutdown signal. Cleaning up and shutting down...");
        shutdown.cancel();
    }

    #[cfg(unix)]
    async fn recv_terminate(&mut self) {
        self.terminate.recv().await;
    }

    #[cfg(not(unix))]
    async fn recv_terminate(&mut self) {
        std::future::pending::<()>().await;
    }
}

/// Resolve when the signal arrives; never resolve if listening for it failed
async fn delivered<F>(signal: F, name: &str)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}
