//! Error types for the admin helpers.

use thiserror::Error;

/// Admin helper errors.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Ordering error (validation, storage, partial failure).
    #[error("ordering error: {0}")]
    Ordering(#[from] oxide_sortable::OrderingError),

    /// Posted form data is missing fields or holds malformed values.
    #[error("invalid form data: {0}")]
    InvalidForm(String),

    /// A configured field name cannot be used.
    #[error("invalid field: {0}")]
    InvalidField(String),
}

/// Result type alias for admin helper operations.
pub type Result<T> = std::result::Result<T, AdminError>;
