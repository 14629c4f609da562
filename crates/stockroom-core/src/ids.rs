//! Core identifier types for stockroom.
//!
//! This module provides strongly-typed identifiers for stored records and
//! in-flight requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A record identifier, unique within the store that assigned it.
///
/// Record IDs are allocated from a monotonic per-store counter starting at 1
/// and are never reused, even after the record they named is deleted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The first ID handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// Create a `RecordId` from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the ID that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Encode the ID as big-endian bytes, so byte order matches numeric order.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode an ID from big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 8 bytes long.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 8,
            got: bytes.len(),
        })?;
        Ok(Self(u64::from_be_bytes(arr)))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    /// Parse a `RecordId` from a decimal path segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::NotAnInteger(s.to_string()))
    }
}

/// A per-request correlation ID, attached to log lines for one request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Generate a new random `RequestId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a non-negative decimal integer.
    #[error("not an integer id: {0:?}")]
    NotAnInteger(String),

    /// The input has an incorrect length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        got: usize,
    },
}
