//! Record types shared by every store implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::FpCategory;

use stockroom_core::RecordId;

/// Untyped field values of a record, in insertion order.
pub type Fields = serde_json::Map<String, Value>;

/// Name of the identifier field in client payloads.
pub const ID_FIELD: &str = "id";

/// A stored resource record.
///
/// Serializes as a flat JSON object: `{"id": 1, "name": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier; immutable after creation.
    pub id: RecordId,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Build a record, discarding any `id` entry in `fields`.
    #[must_use]
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self {
            id,
            fields: without_id(fields),
        }
    }

    /// Look up a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Remove the client-supplied `id`, which is never writable.
#[must_use]
pub fn without_id(fields: Fields) -> Fields {
    fields.into_iter().filter(|(k, _)| k != ID_FIELD).collect()
}

/// Whether a value counts as supplied for a partial update.
///
/// Mirrors loose truthiness: `null`, `false`, `0` and `""` are treated as
/// not supplied, so they never overwrite an existing value.
#[must_use]
pub fn is_supplied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| !matches!(f.classify(), FpCategory::Zero | FpCategory::Nan)),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The set of fields a partial update will write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Fields);

impl Patch {
    /// Keep only the supplied fields of an update payload.
    ///
    /// Drops `id` and every falsy value (see [`is_supplied`]).
    #[must_use]
    pub fn from_supplied(fields: Fields) -> Self {
        Self(
            fields
                .into_iter()
                .filter(|(k, v)| k != ID_FIELD && is_supplied(v))
                .collect(),
        )
    }

    /// Wrap fields that were already filtered.
    #[must_use]
    pub(crate) const fn from_fields(fields: Fields) -> Self {
        Self(fields)
    }

    /// Returns `true` if the patch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The fields that will be written.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.0
    }

    /// Overwrite matching fields of `target`, appending new ones.
    pub fn apply(&self, target: &mut Fields) {
        for (key, value) in &self.0 {
            target.insert(key.clone(), value.clone());
        }
    }
}
