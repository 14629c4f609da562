//! Error types for resource controllers.

use stockroom_core::ResourceKind;
use stockroom_store::{StoreError, ValidationError};
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in controller operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The requested record does not exist.
    #[error("{} not found: {id}", kind.display_name())]
    NotFound {
        /// The kind of record requested.
        kind: ResourceKind,
        /// The id as the client supplied it.
        id: String,
    },

    /// The payload was refused by the record schema.
    ///
    /// The detail is for logs only; clients get a generic message.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        if err.is_rejection() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Store(err)
        }
    }
}

impl From<ValidationError> for ControlError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
