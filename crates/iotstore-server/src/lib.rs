//! # iotstore-server
//!
//! Axum HTTP server for the iotstore Datastore.
//!
//! - **Twirp** (`/twirp/decode.iot.datastore.Datastore/{method}`) and a JSON
//!   envelope endpoint (`/rpc`) dispatching to the method registry
//! - **Pulse** (`/pulse`): database liveness
//! - **Metrics** (`/metrics`): Prometheus exposition
//! - **Shutdown**: drain with timeout, then interrupt in-flight queries

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use metrics::{PrometheusMetrics, install_recorder};
pub use server::{AppState, IotstoreServer, ServerHandle};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
