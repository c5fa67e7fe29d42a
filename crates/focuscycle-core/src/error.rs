//! Core error types for focuscycle-core.
//!
//! Errors are grouped by concern with thiserror. Only validation errors ever
//! reach a timer caller; credit and persistence failures are logged and
//! swallowed inside the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuscycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any state was touched
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup of an entity by identifier failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Key-value persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Application configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The timer driver task is no longer running
    #[error("timer driver has stopped")]
    DriverStopped,

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn category_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: "category",
            id: id.to_string(),
        }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `start` was called without a category to credit
    #[error("a category must be selected before starting the timer")]
    MissingCategory,

    /// Category name empty or too long after trimming
    #[error("category name must be {min}-{max} characters (got {len})")]
    InvalidName { len: usize, min: usize, max: usize },

    /// Numeric setting outside its accepted range
    #[error("'{field}' must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    /// Preference key that names no known toggle
    #[error("unknown preference '{0}' (expected sound, vibration or notification)")]
    UnknownPreference(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {message}")]
    Serialize { key: String, message: String },

    /// Store is unavailable (e.g. poisoned lock)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not exist
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = CoreError::category_not_found("abc");
        assert_eq!(err.to_string(), "category not found: abc");
    }

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::MissingCategory.into();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingCategory)
        ));
    }

    #[test]
    fn unknown_preference_message() {
        let err = ValidationError::UnknownPreference("theme".into());
        assert_eq!(
            err.to_string(),
            "unknown preference 'theme' (expected sound, vibration or notification)"
        );
    }

    #[test]
    fn out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "work_minutes",
            min: 1,
            max: 180,
            value: 0,
        };
        assert_eq!(
            err.to_string(),
            "'work_minutes' must be between 1 and 180 (got 0)"
        );
    }
}
