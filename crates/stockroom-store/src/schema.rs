//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

use stockroom_core::ResourceKind;

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User documents, keyed by big-endian record id.
    pub const USERS: &str = "users";

    /// Product documents, keyed by big-endian record id.
    pub const PRODUCTS: &str = "products";

    /// Index: unique field values, keyed by `kind || 0 || field || 0 || value`.
    pub const UNIQUE: &str = "unique_index";

    /// Per-kind bookkeeping such as the next record id.
    pub const META: &str = "meta";
}

/// The column family holding documents of `kind`.
#[must_use]
pub const fn records_cf(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::User => cf::USERS,
        ResourceKind::Product => cf::PRODUCTS,
    }
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::USERS, cf::PRODUCTS, cf::UNIQUE, cf::META]
}
