//! Key encoding utilities for `RocksDB`.
//!
//! Record keys are big-endian ids so a forward scan yields records in id order.

use serde_json::Value;

use stockroom_core::{IdError, RecordId, ResourceKind};

/// Encode a record key (the id as big-endian bytes).
#[must_use]
pub fn record_key(id: RecordId) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Decode the id from a record key.
///
/// # Errors
///
/// Returns an error if the key is not 8 bytes long.
pub fn record_id_from_key(key: &[u8]) -> Result<RecordId, IdError> {
    RecordId::from_be_slice(key)
}

/// Key of the next-id counter for a kind.
#[must_use]
pub fn counter_key(kind: ResourceKind) -> Vec<u8> {
    format!("next_id/{}", kind.collection()).into_bytes()
}

/// Encode a unique-index key: `kind || 0 || field || 0 || value`.
///
/// Strings are indexed by their raw text; other values by their JSON form.
#[must_use]
pub fn unique_key(kind: ResourceKind, field: &str, value: &Value) -> Vec<u8> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let collection = kind.collection();
    let mut key = Vec::with_capacity(collection.len() + field.len() + rendered.len() + 2);
    key.extend_from_slice(collection.as_bytes());
    key.push(0);
    key.extend_from_slice(field.as_bytes());
    key.push(0);
    key.extend_from_slice(rendered.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_key_roundtrip() {
        let key = record_key(RecordId::new(300));
        assert_eq!(key.len(), 8);
        assert_eq!(record_id_from_key(&key).unwrap(), RecordId::new(300));
    }

    #[test]
    fn record_keys_sort_numerically() {
        assert!(record_key(RecordId::new(2)) < record_key(RecordId::new(10)));
    }

    #[test]
    fn unique_keys_are_scoped_by_kind_and_field() {
        let value = json!("a@x.com");
        let users = unique_key(ResourceKind::User, "email", &value);
        let products = unique_key(ResourceKind::Product, "email", &value);
        assert_ne!(users, products);
        assert!(users.starts_with(b"users\0email\0"));
        assert!(users.ends_with(b"a@x.com"));
    }

    #[test]
    fn counter_keys_differ_per_kind() {
        assert_ne!(
            counter_key(ResourceKind::User),
            counter_key(ResourceKind::Product)
        );
    }
}
