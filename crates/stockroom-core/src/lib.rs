//! Core types and utilities for stockroom.
//!
//! This crate provides the foundational types used throughout the stockroom service:
//!
//! - **Identifiers**: record IDs and per-request correlation IDs
//! - **Resource kinds**: the named collections the service exposes
//!
//! # Example
//!
//! ```
//! use stockroom_core::{RecordId, ResourceKind};
//!
//! // Parse a record ID from a path segment
//! let id: RecordId = "3".parse().unwrap();
//! assert_eq!(id.get(), 3);
//!
//! // Resource kinds know their collection name
//! assert_eq!(ResourceKind::User.collection(), "users");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod kind;

pub use ids::{IdError, RecordId, RequestId};
pub use kind::ResourceKind;
