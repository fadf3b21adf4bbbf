//! Error types for intfd.

use std::io;
use std::path::PathBuf;

use sonic_intfd_store::StoreError;
use thiserror::Error;

/// Result type alias for intfd operations.
pub type IntfdResult<T> = Result<T, IntfdError>;

/// Errors that can occur in the interface daemon.
///
/// Per-interface validation failures are not errors: they become disable
/// reasons on the affected interface.
#[derive(Debug, Error)]
pub enum IntfdError {
    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Failed to load config file {}: {message}", path.display())]
    ConfigFile {
        /// The config file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// An entity with this key is already registered.
    #[error("Duplicate entry: {table}:{key}")]
    DuplicateEntry {
        /// The table name.
        table: String,
        /// The key.
        key: String,
    },

    /// Registry entry not found.
    #[error("Entry not found: {table}:{key}")]
    EntryNotFound {
        /// The table name.
        table: String,
        /// The key.
        key: String,
    },

    /// Store operation failed.
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Underlying IO failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl IntfdError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a config file error.
    pub fn config_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate entry error.
    pub fn duplicate_entry(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateEntry {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates an entry not found error.
    pub fn entry_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::EntryNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            IntfdError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
