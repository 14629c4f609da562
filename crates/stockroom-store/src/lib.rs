//! Resource storage for stockroom.
//!
//! This crate provides the [`ResourceStore`] trait and two implementations:
//!
//! - [`MemoryStore`]: an in-process, lock-guarded `Vec` of records
//! - [`RocksStore`]: a persistent document store on `RocksDB`, enforcing a
//!   [`RecordSchema`] and unique-field indexes
//!
//! Each store owns the records of exactly one [`ResourceKind`] and hands out
//! ids from a monotonic counter, so ids are never reused after a deletion.
//!
//! # Architecture
//!
//! The persistent store uses the following column families:
//!
//! - `users` / `products`: documents, keyed by big-endian record id
//! - `unique_index`: unique field values, pointing at the owning record id
//! - `meta`: the next-id counter of each kind
//!
//! # Example
//!
//! ```
//! use stockroom_core::ResourceKind;
//! use stockroom_store::{Fields, MemoryStore, ResourceStore};
//!
//! # async fn example() -> stockroom_store::Result<()> {
//! let store = MemoryStore::new(ResourceKind::Product);
//!
//! let mut fields = Fields::new();
//! fields.insert("name".into(), "Lamp".into());
//! let record = store.insert(fields).await?;
//! assert_eq!(record.id.get(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod model;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{FieldRule, FieldType, RecordSchema, ValidationError};
pub use rocks::RocksStore;
pub use types::{is_supplied, Fields, Patch, Record};

use async_trait::async_trait;
use stockroom_core::{RecordId, ResourceKind};

/// The storage trait defining all record operations for one resource kind.
///
/// Absence is never an error: lookups return `None` and removals return
/// `false`. Errors mean the operation itself could not complete or was
/// refused by the store's schema.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// The kind of record this store owns.
    fn kind(&self) -> ResourceKind;

    /// The document schema this store enforces, if any.
    fn schema(&self) -> Option<&RecordSchema> {
        None
    }

    /// List every record, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list(&self) -> Result<Vec<Record>>;

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>>;

    /// Assign the next id to `fields`, append the record, and return it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` or `StoreError::Conflict` if the
    /// document violates the store's schema.
    async fn insert(&self, fields: Fields) -> Result<Record>;

    /// Merge `patch` into the record with the given id.
    ///
    /// Returns `None` if no such record exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` or `StoreError::Conflict` if the
    /// merged document violates the store's schema.
    async fn update(&self, id: RecordId, patch: Patch) -> Result<Option<Record>>;

    /// Remove the record with the given id.
    ///
    /// Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    async fn remove(&self, id: RecordId) -> Result<bool>;
}
