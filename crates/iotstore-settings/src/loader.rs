//! Settings loading.
//!
//! Layers, lowest priority first:
//! 1. Compiled [`Settings::default()`]
//! 2. An optional JSON file
//! 3. `IOTSTORE_*` environment variables, with `__` separating nested keys
//!    (`IOTSTORE_SERVER__ADDR` sets `server.addr`)
//!
//! Command-line flags are applied by the binary on top of the result.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::Settings;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "IOTSTORE_";

/// The layered provider stack, before extraction.
pub fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = path {
        figment = figment.merge(Json::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings from defaults, `path` (if given) and the environment.
///
/// A `path` that does not exist is an error; leaving it out is not.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(SettingsError::MissingFile(path.to_path_buf()));
        }
        debug!(?path, "loading settings file");
    }
    let settings: Settings = figment(path).extract()?;
    Ok(settings)
}
