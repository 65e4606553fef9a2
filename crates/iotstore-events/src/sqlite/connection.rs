//! `SQLite` connection pool with WAL mode.
//!
//! Uses `r2d2` connection pooling with the `r2d2_sqlite` backend. The
//! [`PragmaCustomizer`] runs on every acquired connection so journal mode,
//! busy timeout and cache size hold no matter which connection serves a
//! request.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::{Result, StoreError};

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 16). Ignored for in-memory databases,
    /// which always use a single connection.
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// Cache size in KiB (default: 8192 = 8 MB).
    pub cache_size_kib: i64,
    /// How long to wait for a pooled connection in milliseconds (default: 5000).
    pub acquire_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            acquire_timeout_ms: 5000,
        }
    }
}

/// Where the event database lives.
///
/// Accepted forms:
///
/// - `sqlite::memory:` or `:memory:` for a private in-memory database
/// - `sqlite://<path>` or `sqlite:<path>`
/// - a bare filesystem path
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// Private in-memory database (lost when the pool closes).
    Memory,
    /// Database file on disk, created on first open.
    File(PathBuf),
}

impl FromStr for DatabaseUrl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreError::connection("database url is empty"));
        }
        if matches!(s, "sqlite::memory:" | ":memory:" | "sqlite://:memory:") {
            return Ok(Self::Memory);
        }
        if let Some(path) = s.strip_prefix("sqlite://").or_else(|| s.strip_prefix("sqlite:")) {
            if path.is_empty() {
                return Err(StoreError::connection("database url has no path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = s.split_once("://") {
            return Err(StoreError::connection(format!(
                "unsupported database url scheme: {scheme}"
            )));
        }
        Ok(Self::File(PathBuf::from(s)))
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "sqlite::memory:"),
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
    cache_size_kib: i64,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA cache_size = -{};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms, self.cache_size_kib
        ))?;
        Ok(())
    }
}

/// Open a pool for `url`.
///
/// Blocks until the first connection is established or the acquire timeout
/// elapses; an unreachable database surfaces as [`StoreError::Connection`].
pub fn open_pool(url: &DatabaseUrl, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let (manager, max_size) = match url {
        // Every in-memory connection is its own database, so never hand out
        // more than one.
        DatabaseUrl::Memory => (SqliteConnectionManager::memory(), 1),
        DatabaseUrl::File(path) => (SqliteConnectionManager::file(path), config.pool_size.max(1)),
    };

    Pool::builder()
        .max_size(max_size)
        .min_idle(Some(1))
        .connection_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
            cache_size_kib: config.cache_size_kib,
        }))
        .build(manager)
        .map_err(|e| StoreError::connection(format!("failed to open {url}: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
