//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A row with the same ID already exists.
    #[error("duplicate {table} row {id}")]
    Duplicate {
        /// Table name.
        table: &'static str,
        /// Conflicting row ID.
        id: u64,
    },

    /// The row to update does not exist.
    #[error("{table} row {id} not found")]
    NotFound {
        /// Table name.
        table: &'static str,
        /// Missing row ID.
        id: u64,
    },

    /// The page cursor does not belong to this store.
    #[error("invalid page cursor: {0}")]
    InvalidCursor(String),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Failure injected for testing.
    #[error("injected failure on {op}")]
    Injected {
        /// The operation that failed.
        op: String,
    },
}

impl StoreError {
    /// Creates a snapshot error from any displayable error.
    pub fn snapshot(err: impl std::fmt::Display) -> Self {
        Self::Snapshot(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Duplicate {
            table: "compose_module",
            id: 42,
        };
        assert_eq!(err.to_string(), "duplicate compose_module row 42");

        let err = StoreError::Injected {
            op: "search_pages".into(),
        };
        assert!(err.to_string().contains("search_pages"));
    }
}
