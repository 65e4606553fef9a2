//! Dependencies shared by every RPC handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use iotstore_core::Metrics;

use crate::datastore::Datastore;

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// Backing Datastore implementation.
    pub datastore: Arc<dyn Datastore>,
    /// Sink for per-method metrics.
    pub metrics: Arc<dyn Metrics>,
    /// Fires when the server shuts down; in-flight queries are interrupted.
    pub cancel: CancellationToken,
}

impl RpcContext {
    /// Build a context.
    pub fn new(datastore: Arc<dyn Datastore>, metrics: Arc<dyn Metrics>, cancel: CancellationToken) -> Self {
        Self {
            datastore,
            metrics,
            cancel,
        }
    }
}
