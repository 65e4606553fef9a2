//! Lifecycle owner of the connection pool.

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool, DatabaseUrl, open_pool};
use crate::sqlite::migrations::run_migrations;

/// Owns the pool between [`start`](Self::start) and [`stop`](Self::stop).
///
/// Outside that window every accessor fails with
/// [`StoreError::Connection`].
#[derive(Debug)]
pub struct ConnectionManager {
    url: String,
    config: ConnectionConfig,
    pool: RwLock<Option<ConnectionPool>>,
}

impl ConnectionManager {
    /// Create a stopped manager for `url`. Nothing is opened yet.
    pub fn new(url: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            url: url.into(),
            config,
            pool: RwLock::new(None),
        }
    }

    /// Open the pool and bring the schema up to date.
    ///
    /// Fails with [`StoreError::Connection`] if the URL is malformed or the
    /// database cannot be opened. Starting twice replaces the running pool.
    pub async fn start(&self) -> Result<()> {
        let url: DatabaseUrl = self.url.parse()?;
        let config = self.config.clone();
        info!(database = %url, pool_size = config.pool_size, "starting connection pool");

        let pool = tokio::task::spawn_blocking(move || -> Result<ConnectionPool> {
            let pool = open_pool(&url, &config)?;
            let conn = pool
                .get()
                .map_err(|e| StoreError::connection(format!("failed to acquire connection: {e}")))?;
            let _ = run_migrations(&conn)?;
            drop(conn);
            Ok(pool)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("pool start task failed: {e}")))??;

        if self.pool.write().replace(pool).is_some() {
            warn!("connection pool was already running, replaced it");
        }
        Ok(())
    }

    /// Close the pool. Subsequent operations fail until the next start.
    pub fn stop(&self) {
        if self.pool.write().take().is_some() {
            info!("connection pool stopped");
        } else {
            debug!("stop requested but connection pool was not running");
        }
    }

    /// Whether the pool is open.
    pub fn is_started(&self) -> bool {
        self.pool.read().is_some()
    }

    /// A handle to the running pool.
    pub fn pool(&self) -> Result<ConnectionPool> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| StoreError::connection("connection pool not started"))
    }

    /// Round-trip `SELECT 1` through a pooled connection.
    ///
    /// Idle pooled connections can look healthy while the database is gone,
    /// so this always executes a real statement.
    pub async fn ping(&self) -> Result<()> {
        let pool = self.pool()?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Internal(format!("ping task failed: {e}")))?
    }
}
