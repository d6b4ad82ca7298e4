//! Core error types for habitkeep-core.
//!
//! This module defines the error hierarchy using thiserror. Engine
//! operations return [`CoreError`]; storage adapters return [`StoreError`],
//! which converts into `CoreError` so that a missing record surfaces as
//! [`CoreError::NotFound`] and every other storage failure as
//! [`CoreError::StoreUnavailable`].

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for habitkeep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller-supplied arguments failed a precondition
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Referenced habit or streak does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The habit already has a completion on this calendar date
    #[error("Habit '{habit_id}' is already completed on {date}")]
    AlreadyCompleted { habit_id: String, date: NaiveDate },

    /// Opaque passthrough from the storage collaborator
    #[error("Store unavailable: {0}")]
    StoreUnavailable(StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether this is the idempotence guard rather than a hard failure.
    ///
    /// Front-ends render this outcome as a status, not as an error.
    pub fn is_already_completed(&self) -> bool {
        matches!(self, CoreError::AlreadyCompleted { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Storage adapter errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Conditional update lost against a concurrent writer
    #[error("Conditional update on {entity} '{id}' conflicted with a concurrent write")]
    Conflict { entity: &'static str, id: String },

    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt {field} value: {value}")]
    Corrupt { field: &'static str, value: String },

    /// A thread panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not resolve the data directory
    #[error("Failed to resolve data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required text field is empty
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::StoreUnavailable(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    StoreError::Locked
                }
                _ => StoreError::QueryFailed(err.to_string()),
            },
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
