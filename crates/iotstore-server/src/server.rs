//! `IotstoreServer`: Axum router assembly and the listening lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use iotstore_core::{Metrics, NoopMetrics};
use iotstore_events::EventStore;
use iotstore_rpc::{DatastoreService, MethodRegistry, RpcContext, datastore_registry};

use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::middleware::{MakeRequestUuidV7, record_request, request_span};
use crate::routes::{TWIRP_ROUTE, metrics_handler, pulse_handler, rpc_handler, twirp_handler};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// RPC method registry.
    pub registry: Arc<MethodRegistry>,
    /// Context handed to every RPC handler.
    pub rpc: Arc<RpcContext>,
    /// Store probed by `/pulse`.
    pub store: Arc<EventStore>,
    /// Sink for HTTP request metrics.
    pub metrics: Arc<dyn Metrics>,
    /// Renders `/metrics`; `None` disables the endpoint.
    pub prometheus: Option<PrometheusHandle>,
}

/// The iotstore HTTP server.
pub struct IotstoreServer {
    config: ServerConfig,
    store: Arc<EventStore>,
    registry: Arc<MethodRegistry>,
    metrics: Arc<dyn Metrics>,
    prometheus: Option<PrometheusHandle>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl IotstoreServer {
    /// Create a server for a started store. Metrics are discarded until
    /// [`with_metrics`](Self::with_metrics) is called.
    pub fn new(config: ServerConfig, store: Arc<EventStore>) -> Self {
        Self {
            config,
            store,
            registry: Arc::new(datastore_registry()),
            metrics: Arc::new(NoopMetrics),
            prometheus: None,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Report to `metrics` and serve `/metrics` from `prometheus`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>, prometheus: Option<PrometheusHandle>) -> Self {
        self.metrics = metrics;
        self.prometheus = prometheus;
        self
    }

    /// Replace the method registry.
    #[must_use]
    pub fn with_registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Build the Axum router with all routes and middleware.
    pub fn router(&self) -> Router {
        let datastore = Arc::new(DatastoreService::new(self.store.clone(), self.config.verbose));
        let rpc = RpcContext::new(datastore, self.metrics.clone(), self.shutdown.abort_token());
        let state = AppState {
            registry: self.registry.clone(),
            rpc: Arc::new(rpc),
            store: self.store.clone(),
            metrics: self.metrics.clone(),
            prometheus: self.prometheus.clone(),
        };

        Router::new()
            .route(TWIRP_ROUTE, post(twirp_handler))
            .route("/rpc", post(rpc_handler))
            .route("/pulse", get(pulse_handler))
            .route("/metrics", get(metrics_handler))
            .layer(from_fn_with_state(state.clone(), record_request))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Bind the configured address and start serving in the background.
    pub async fn listen(&self) -> Result<ServerHandle, ServerError> {
        let listener = TcpListener::bind(self.config.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.addr,
                source,
            })?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let drain = self.shutdown.token();

        info!(%addr, "server listening");
        let task = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router)
                .with_graceful_shutdown(drain.cancelled_owned())
                .await
            {
                error!(%error, "server error");
            }
        });

        Ok(ServerHandle {
            addr,
            task,
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
        })
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the method registry.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    task: JoinHandle<()>,
    shutdown: Arc<ShutdownCoordinator>,
    config: ServerConfig,
}

impl ServerHandle {
    /// The bound address (the real port when configured with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and drain in-flight requests.
    ///
    /// Returns `false` if requests had to be interrupted.
    pub async fn stop(self) -> bool {
        info!(addr = %self.addr, "server stopping");
        self.shutdown
            .graceful_shutdown(vec![self.task], self.config.shutdown_timeout)
            .await
    }
}
