//! Error types for the SQLite store.

use oxide_sortable::StorageError;
use thiserror::Error;

/// SQLite store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A scoped operation was requested on a table without a scope column.
    #[error("table '{0}' has no scope column")]
    Unscoped(String),

    /// An ordering refers to a column the store does not know.
    #[error("cannot order by unknown column '{0}'")]
    UnknownColumn(String),

    /// An update matched no row.
    #[error("record {0} not found")]
    RecordNotFound(i64),
}

impl From<SqliteStoreError> for StorageError {
    fn from(err: SqliteStoreError) -> Self {
        Self::new(err)
    }
}

/// Result type alias for SQLite store operations.
pub type Result<T> = std::result::Result<T, SqliteStoreError>;
