//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the HTTP server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (default `0.0.0.0:8080`; port 0 auto-assigns).
    pub addr: SocketAddr,
    /// Log every RPC request at info level.
    pub verbose: bool,
    /// How long in-flight requests get to finish after shutdown starts.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            verbose: false,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
