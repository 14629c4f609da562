//! Resource kinds served by stockroom.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named category of record with its own store and field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// People registered with the service.
    User,
    /// Items offered for sale.
    Product,
}

impl ResourceKind {
    /// Every kind, in routing order.
    pub const ALL: [Self; 2] = [Self::User, Self::Product];

    /// The collection name, used as the URL path segment.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Product => "products",
        }
    }

    /// The capitalized singular name used in client-facing messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Product => "Product",
        }
    }

    /// Message returned to clients when a record of this kind is missing.
    #[must_use]
    pub const fn not_found_message(self) -> &'static str {
        match self {
            Self::User => "User not found",
            Self::Product => "Product not found",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}
