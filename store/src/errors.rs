// store/src/errors.rs

use sled::transaction::TransactionError;
pub use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique-email constraint fired at insert time.
    #[error("email is already registered")]
    DuplicateEmail,
    /// A unique-employee-id constraint fired at insert time.
    #[error("employee id is already registered")]
    DuplicateEmployeeId,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Write-time cap on emergency contacts per patient.
    #[error("a patient may have at most 2 emergency contacts")]
    ContactLimit,
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// Unwrap transaction failures back into the domain error that aborted
// them; storage-level conflicts surface as sled errors.
impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => StoreError::Sled(e),
        }
    }
}

/// A type alias for a `Result` that returns a `StoreError` on failure.
pub type StoreResult<T> = Result<T, StoreError>;
