//! Error types for store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transaction commit was rejected by the store.
    #[error("Transaction commit failed: {message}")]
    Commit {
        /// Error message.
        message: String,
    },

    /// A snapshot file could not be read or parsed.
    #[error("Failed to load snapshot {}: {message}", path.display())]
    Snapshot {
        /// The snapshot path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A write referenced a row that does not exist.
    #[error("Row not found: {table}:{key}")]
    RowNotFound {
        /// The table name.
        table: String,
        /// The row key.
        key: String,
    },
}

impl StoreError {
    /// Creates a commit error.
    pub fn commit(message: impl Into<String>) -> Self {
        Self::Commit {
            message: message.into(),
        }
    }

    /// Creates a snapshot error.
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a row-not-found error.
    pub fn row_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::RowNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on a later pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Commit { .. })
    }
}
