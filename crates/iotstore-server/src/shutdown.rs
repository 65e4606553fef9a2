//! Graceful shutdown coordination via `CancellationToken`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates a two-phase shutdown.
///
/// The drain token stops accepting new connections and lets in-flight
/// requests finish. If they are still running when the timeout expires the
/// abort token fires, which interrupts their database work.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    drain: CancellationToken,
    abort: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled as soon as shutdown starts.
    pub fn token(&self) -> CancellationToken {
        self.drain.clone()
    }

    /// Token cancelled once the drain timeout has expired.
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Start draining.
    pub fn shutdown(&self) {
        self.drain.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.drain.is_cancelled()
    }

    /// Start draining, then wait up to `timeout` for `handles`.
    ///
    /// Returns `true` when every task finished in time. Otherwise the abort
    /// token is cancelled, the tasks are aborted and `false` is returned.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Duration) -> bool {
        self.shutdown();
        info!(
            task_count = handles.len(),
            timeout_ms = timeout.as_millis(),
            "waiting for in-flight requests"
        );

        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let drain = futures::future::join_all(handles);

        if tokio::time::timeout(timeout, drain).await.is_ok() {
            return true;
        }
        warn!("shutdown timed out after {timeout:?}, interrupting remaining requests");
        self.abort.cancel();
        for handle in aborts {
            handle.abort();
        }
        false
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received SIGTERM"),
    }
}
