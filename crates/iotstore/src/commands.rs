//! Subcommand implementations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use iotstore_core::{Metrics, NoopMetrics, retry_with_backoff};
use iotstore_events::{ConnectionConfig, ConnectionManager, EventStore};
use iotstore_logging::SERVICE_NAME;
use iotstore_server::{IotstoreServer, PrometheusMetrics, ServerConfig, install_recorder, shutdown_signal};
use iotstore_settings::{PoolSettings, Settings};

use crate::cli::DeleteArgs;

/// Injected at build time by the release pipeline.
const BUILD_DATE: &str = match option_env!("IOTSTORE_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Pool tuning from settings.
pub fn connection_config(pool: &PoolSettings) -> ConnectionConfig {
    ConnectionConfig {
        pool_size: pool.pool_size,
        busy_timeout_ms: pool.busy_timeout_ms,
        cache_size_kib: pool.cache_size_kib,
        acquire_timeout_ms: pool.acquire_timeout_ms,
    }
}

/// HTTP server configuration from settings.
pub fn server_config(settings: &Settings) -> Result<ServerConfig> {
    Ok(ServerConfig {
        addr: settings.listen_addr().context("invalid listen address")?,
        verbose: settings.server.verbose,
        shutdown_timeout: Duration::from_secs(settings.server.shutdown_timeout_secs),
    })
}

/// Open the store, retrying with backoff until the database is reachable.
pub async fn open_store(settings: &Settings, metrics: Arc<dyn Metrics>) -> Result<EventStore> {
    let store = EventStore::new(ConnectionManager::new(
        settings.database_url.clone(),
        connection_config(&settings.pool),
    ))
    .with_metrics(metrics);

    retry_with_backoff(&settings.retry, "start event store", || store.start())
        .await
        .context("failed to connect to database")?;
    Ok(store)
}

/// `iotstore server`: serve until Ctrl-C or SIGTERM.
pub async fn run_server(settings: &Settings) -> Result<()> {
    let prometheus = install_recorder().context("failed to install metrics recorder")?;
    let metrics: Arc<dyn Metrics> = Arc::new(PrometheusMetrics);
    metrics.set_build_info(SERVICE_NAME, env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let store = Arc::new(open_store(settings, metrics.clone()).await?);
    let server = IotstoreServer::new(server_config(settings)?, store.clone())
        .with_metrics(metrics, Some(prometheus));
    let handle = server.listen().await.context("failed to start HTTP server")?;

    shutdown_signal().await;
    if !handle.stop().await {
        warn!("in-flight requests were interrupted");
    }
    store.stop();
    info!("shutdown complete");
    Ok(())
}

/// `iotstore delete`: remove, or with a dry run count, events older than
/// `--before`. Ctrl-C rolls the deletion back.
pub async fn run_delete(settings: &Settings, args: &DeleteArgs) -> Result<u64> {
    let store = open_store(settings, Arc::new(NoopMetrics)).await?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let result = store.delete_before(&cancel, args.before, args.execute).await;
    watcher.abort();
    store.stop();

    let count = result.context("failed to delete events")?;
    if args.execute {
        info!(count, before = %args.before, "deleted old events");
    } else {
        info!(count, before = %args.before, "dry run, nothing deleted (pass --execute to delete)");
    }
    Ok(count)
}
