//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while setting up or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Other socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Prometheus recorder could not be built or installed.
    #[error("metrics recorder error: {0}")]
    Metrics(String),
}
