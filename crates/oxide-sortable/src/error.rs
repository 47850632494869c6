//! Error types for ordering operations.

use std::error::Error as StdError;

use thiserror::Error;

use crate::record::RecordId;

/// A failure reported by an [`OrderStore`](crate::OrderStore).
///
/// Stores wrap whatever their backend raises (sqlx errors, lock poisoning,
/// injected faults) so the ordering core stays storage-agnostic.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StorageError(Box<dyn StdError + Send + Sync>);

impl StorageError {
    /// Wraps a backend error.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(source.into())
    }

    /// Creates a storage error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }
}

/// Errors raised by the ordering core.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The batch is malformed, references unknown records, or spans scopes.
    #[error("validation error: {0}")]
    Validation(String),

    /// Read or write failure surfaced from the store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A write failed and some records kept their new order.
    #[error("reorder partially applied, records left modified: {}", format_ids(.modified))]
    PartialFailure {
        /// Records whose stored order no longer matches the pre-apply state.
        modified: Vec<RecordId>,
        /// The write failure that interrupted the batch.
        #[source]
        source: StorageError,
    },
}

impl OrderingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn format_ids(ids: &[RecordId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for ordering operations.
pub type Result<T> = std::result::Result<T, OrderingError>;
