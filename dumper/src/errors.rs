//! Error types for the keyspace dumper
//!
//! Every failure here is fatal to the dump run that hit it. Per-key anomalies
//! (unsupported types, vanished keys) are not errors and never reach this type.

use std::fmt;

/// Main error type for a dump run
#[derive(Debug)]
pub enum DumpError {
    /// Could not open or authenticate a connection to the store
    Connection { url: String, reason: String },

    /// A read against the store failed
    Store {
        operation: String,
        key: Option<String>,
        reason: String,
    },

    /// Output or report file I/O failed
    Io { path: String, reason: String },

    /// Dump options failed validation
    InvalidOptions { field: String, reason: String },

    /// A spawned dump task panicked or was cancelled
    Task { reason: String },
}

impl DumpError {
    pub fn store(operation: &str, key: Option<&str>, err: impl fmt::Display) -> Self {
        DumpError::Store {
            operation: operation.to_string(),
            key: key.map(str::to_string),
            reason: err.to_string(),
        }
    }

    pub fn io(path: impl fmt::Display, err: impl fmt::Display) -> Self {
        DumpError::Io {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn invalid_options(field: &str, reason: &str) -> Self {
        DumpError::InvalidOptions {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpError::Connection { url, reason } => {
                write!(f, "Connection to {} failed: {}", url, reason)
            }
            DumpError::Store {
                operation,
                key: Some(key),
                reason,
            } => {
                write!(f, "{} failed for key '{}': {}", operation, key, reason)
            }
            DumpError::Store {
                operation,
                key: None,
                reason,
            } => {
                write!(f, "{} failed: {}", operation, reason)
            }
            DumpError::Io { path, reason } => {
                write!(f, "I/O error on '{}': {}", path, reason)
            }
            DumpError::InvalidOptions { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            DumpError::Task { reason } => {
                write!(f, "Dump task failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for DumpError {}

impl From<tokio::task::JoinError> for DumpError {
    fn from(err: tokio::task::JoinError) -> Self {
        DumpError::Task {
            reason: err.to_string(),
        }
    }
}
