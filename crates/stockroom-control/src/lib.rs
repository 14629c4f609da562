//! Resource controllers for stockroom.
//!
//! A controller implements the five REST operations for one resource kind on
//! top of an injected [`ResourceStore`](stockroom_store::ResourceStore). It
//! decides what "not found" and "bad request" mean; transport concerns stay
//! in the gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Gateway (HTTP pipeline)                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ResourceController<S>                     │
//! │   list_all · get_one · create · update · delete             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//!          ┌─────────────┐          ┌──────────────┐
//!          │ MemoryStore │          │  RocksStore  │
//!          │   (Vec)     │          │  (RocksDB)   │
//!          └─────────────┘          └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use stockroom_control::ResourceController;
//! use stockroom_core::ResourceKind;
//! use stockroom_store::{Fields, MemoryStore};
//!
//! # async fn example() -> stockroom_control::Result<()> {
//! let products = ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::Product)));
//!
//! let mut fields = Fields::new();
//! fields.insert("name".into(), "Lamp".into());
//! let record = products.create(fields).await?;
//!
//! products.delete(record.id).await?;
//! assert!(products.get_one(record.id).await.is_err());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod controller;
pub mod error;

pub use controller::ResourceController;
pub use error::{ControlError, Result};

// Re-export commonly used types from dependencies for convenience
pub use stockroom_core::{RecordId, ResourceKind};
pub use stockroom_store::{Fields, Record};
