//! Error types for the storage layer.

use thiserror::Error;

use crate::model::ValidationError;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
///
/// A missing record is never an error; lookups return `Option` and removals
/// return `bool` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The round trip to the backing store could not complete.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document does not satisfy the store's schema.
    #[error("document rejected: {0}")]
    Rejected(#[from] ValidationError),

    /// A unique field already holds this value in another record.
    #[error("duplicate value for unique field `{field}`")]
    Conflict {
        /// The unique field that collided.
        field: String,
    },
}

impl StoreError {
    /// Returns `true` if the store refused the write because of its contents,
    /// as opposed to failing to complete the round trip.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Conflict { .. })
    }
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
