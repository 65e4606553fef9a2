//! Settings types.
//!
//! Every struct uses `#[serde(default)]` so a partial file or a single
//! environment variable only overrides the fields it names.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use iotstore_core::RetryConfig;

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Database URL (`sqlite://<path>`, `sqlite::memory:`, or a bare path).
    /// Empty until supplied by a file, `IOTSTORE_DATABASE_URL` or a flag.
    pub database_url: String,
    /// HTTP listener.
    pub server: ServerSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Connection pool tuning.
    pub pool: PoolSettings,
    /// Startup retry policy.
    pub retry: RetryConfig,
}

impl Settings {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "database_url must be set (flag --database-url or IOTSTORE_DATABASE_URL)".into(),
            ));
        }
        let _ = self.listen_addr()?;
        if self.pool.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "pool.pool_size must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(SettingsError::InvalidValue(format!(
                "retry.jitter_factor must be between 0 and 1, got {}",
                self.retry.jitter_factor
            )));
        }
        Ok(())
    }

    /// The parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.addr.parse().map_err(|e| {
            SettingsError::InvalidValue(format!("server.addr {:?}: {e}", self.server.addr))
        })
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub addr: String,
    /// Log every RPC request at info level.
    pub verbose: bool,
    /// How long in-flight requests get to finish after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".into(),
            verbose: false,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, for terminals.
    Pretty,
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Json,
        }
    }
}

/// Connection pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum pooled connections (forced to 1 for in-memory databases).
    pub pool_size: u32,
    /// `SQLite` busy timeout.
    pub busy_timeout_ms: u32,
    /// Page cache per connection.
    pub cache_size_kib: i64,
    /// How long a caller waits for a free connection.
    pub acquire_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8_192,
            acquire_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Settings {
        Settings {
            database_url: "sqlite::memory:".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.database_url.is_empty());
        assert_eq!(settings.server.addr, "0.0.0.0:8080");
        assert!(!settings.server.verbose);
        assert_eq!(settings.server.shutdown_timeout_secs, 5);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.pool.pool_size, 16);
        assert_eq!(settings.retry.max_elapsed_ms, 300_000);
    }

    #[test]
    fn valid_settings_pass() {
        valid().validate().unwrap();
        assert_eq!(valid().listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn empty_database_url_is_rejected() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("database_url"));
    }

    #[test]
    fn bad_addr_is_rejected() {
        let mut settings = valid();
        settings.server.addr = "localhost".into();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("server.addr"));
    }

    #[test]
    fn zero_pool_is_rejected() {
        let mut settings = valid();
        settings.pool.pool_size = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn jitter_out_of_range_is_rejected() {
        let mut settings = valid();
        settings.retry.jitter_factor = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"server": {"verbose": true}, "logging": {"format": "pretty"}}"#)
                .unwrap();
        assert!(settings.server.verbose);
        assert_eq!(settings.server.addr, "0.0.0.0:8080");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert_eq!(settings.logging.level, "info");
    }
}
