//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An explicitly requested settings file does not exist.
    #[error("settings file not found: {}", .0.display())]
    MissingFile(PathBuf),
    /// A source could not be read or did not match the settings shape.
    #[error("failed to load settings: {0}")]
    Load(Box<figment::Error>),
    /// A settings value was invalid (e.g. an unparsable address).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_display() {
        let err = SettingsError::MissingFile(PathBuf::from("/etc/iotstore.json"));
        assert_eq!(err.to_string(), "settings file not found: /etc/iotstore.json");
    }

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("pool.pool_size must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "invalid settings value: pool.pool_size must be at least 1"
        );
    }

    #[test]
    fn figment_error_is_boxed() {
        let err: SettingsError = figment::Error::from("boom".to_string()).into();
        assert!(matches!(err, SettingsError::Load(_)));
        assert!(err.to_string().contains("boom"));
    }
}
