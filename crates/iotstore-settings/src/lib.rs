//! # iotstore-settings
//!
//! Layered configuration for the iotstore service: compiled defaults, an
//! optional JSON file, then `IOTSTORE_*` environment variables.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{ENV_PREFIX, figment, load_settings};
pub use types::{LogFormat, LoggingSettings, PoolSettings, ServerSettings, Settings};
