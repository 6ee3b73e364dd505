//! Error types for post-processor options.
//!
//! [`SettingsError`] covers reading, writing and parsing options;
//! [`ConfigError`] covers values that parse but are not acceptable.

use std::io;
use thiserror::Error;

/// Errors raised while building a [`crate::PostOptions`].
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The options file could not be read.
    #[error("Cannot read options file {0}")]
    LoadError(String),

    /// The options file could not be written.
    #[error("Cannot write options file {0}")]
    SaveError(String),

    /// An argument or option value could not be parsed.
    #[error("Bad value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Malformed JSON options.
    #[error("JSON options: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed TOML options.
    #[error("TOML options: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Options could not be rendered as TOML.
    #[error("TOML output: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// A value was parsed but rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SettingsError {
    /// Create an invalid-setting error
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Option values outside what the generator accepts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Options files must end in `.toml` or `.json`.
    #[error("Options file must be .toml or .json: {0}")]
    UnsupportedFormat(String),

    /// Numeric option outside its valid range.
    #[error("'{key}' out of range: {value}")]
    ValueOutOfRange { key: String, value: String },

    /// No per-user configuration directory on this platform.
    #[error("No configuration directory: {0}")]
    UnsupportedPlatform(String),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SettingsError::invalid("precision", "expected a non-negative integer");
        assert_eq!(
            err.to_string(),
            "Bad value for 'precision': expected a non-negative integer"
        );

        let err: SettingsError = ConfigError::ValueOutOfRange {
            key: "workpiece_length".to_string(),
            value: "-5".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "'workpiece_length' out of range: -5");
    }

    #[test]
    fn test_conversions() {
        let err: SettingsError = ConfigError::UnsupportedFormat("opts.ini".to_string()).into();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));

        let err: SettingsError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SettingsError::IoError(_)));
    }
}
