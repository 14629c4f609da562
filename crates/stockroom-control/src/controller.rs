//! Resource controller implementation.
//!
//! A `ResourceController` turns the five REST operations into store calls and
//! maps store outcomes into `ControlError`s. It holds no state of its own.

use std::sync::Arc;

use stockroom_core::{RecordId, ResourceKind};
use stockroom_store::{Fields, Patch, Record, ResourceStore};

use crate::error::{ControlError, Result};

/// List/get/create/update/delete over one injected store.
pub struct ResourceController<S: ResourceStore> {
    store: Arc<S>,
}

impl<S: ResourceStore> Clone for ResourceController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ResourceStore> ResourceController<S> {
    /// Create a controller over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The kind of record this controller serves.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.store.kind()
    }

    /// Parse a path id; anything that is not an id names no record.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NotFound` if `raw` is not a non-negative integer.
    pub fn resolve_id(&self, raw: &str) -> Result<RecordId> {
        raw.parse().map_err(|_| self.not_found(raw))
    }

    fn not_found(&self, id: impl ToString) -> ControlError {
        ControlError::NotFound {
            kind: self.kind(),
            id: id.to_string(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Every record, in id order.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Store` if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<Record>> {
        Ok(self.store.list().await?)
    }

    /// The record with the given id.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NotFound` if no such record exists.
    pub async fn get_one(&self, id: RecordId) -> Result<Record> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Store a new record built from `fields`.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::BadRequest` if the store's schema refuses the
    /// document or a unique field is already taken.
    pub async fn create(&self, fields: Fields) -> Result<Record> {
        let fields = match self.store.schema() {
            Some(schema) => schema.conform(&fields).map_err(|e| {
                tracing::debug!(kind = %self.kind(), error = %e, "Create rejected");
                ControlError::from(e)
            })?,
            None => fields,
        };

        let record = self.store.insert(fields).await.map_err(|e| {
            if e.is_rejection() {
                tracing::debug!(kind = %self.kind(), error = %e, "Create rejected");
            }
            ControlError::from(e)
        })?;

        tracing::info!(kind = %self.kind(), id = %record.id, "Created record");
        Ok(record)
    }

    /// Merge the supplied fields of `fields` into an existing record.
    ///
    /// Falsy values (`null`, `false`, `0`, `""`) count as not supplied and
    /// leave the stored value in place, so an empty payload is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NotFound` for an unknown id and
    /// `ControlError::BadRequest` if the schema refuses the merged record.
    /// The store checks the id before it applies its schema.
    pub async fn update(&self, id: RecordId, fields: Fields) -> Result<Record> {
        let patch = Patch::from_supplied(fields);

        let record = self
            .store
            .update(id, patch)
            .await
            .map_err(|e| {
                if e.is_rejection() {
                    tracing::debug!(kind = %self.kind(), %id, error = %e, "Update rejected");
                }
                ControlError::from(e)
            })?
            .ok_or_else(|| self.not_found(id))?;

        tracing::info!(kind = %self.kind(), %id, "Updated record");
        Ok(record)
    }

    /// Remove a record permanently.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NotFound` if no such record exists.
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        if !self.store.remove(id).await? {
            return Err(self.not_found(id));
        }

        tracing::info!(kind = %self.kind(), %id, "Deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use stockroom_store::{MemoryStore, RocksStore, StoreError};
    use tempfile::TempDir;

    /// A store whose every round trip fails.
    struct UnreachableStore;

    #[async_trait]
    impl ResourceStore for UnreachableStore {
        fn kind(&self) -> ResourceKind {
            ResourceKind::User
        }

        async fn list(&self) -> stockroom_store::Result<Vec<Record>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_id(&self, _id: RecordId) -> stockroom_store::Result<Option<Record>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn insert(&self, _fields: Fields) -> stockroom_store::Result<Record> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn update(
            &self,
            _id: RecordId,
            _patch: Patch,
        ) -> stockroom_store::Result<Option<Record>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn remove(&self, _id: RecordId) -> stockroom_store::Result<bool> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn products() -> ResourceController<MemoryStore> {
        ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::Product)))
    }

    fn persistent_users() -> (ResourceController<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path(), ResourceKind::User).unwrap();
        (ResourceController::new(Arc::new(store)), dir)
    }

    #[tokio::test]
    async fn list_empty() {
        assert!(products().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let controller = products();
        for expected in 1..=3 {
            let record = controller
                .create(fields(json!({ "name": format!("p{expected}") })))
                .await
                .unwrap();
            assert_eq!(record.id.get(), expected);
        }
        assert_eq!(controller.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let result = products().get_one(RecordId::new(9)).await;
        assert!(matches!(
            result,
            Err(ControlError::NotFound {
                kind: ResourceKind::Product,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn resolve_id_rejects_non_integers() {
        let controller = products();
        assert_eq!(controller.resolve_id("12").unwrap().get(), 12);
        assert!(matches!(
            controller.resolve_id("abc"),
            Err(ControlError::NotFound { .. })
        ));
        assert!(controller.resolve_id("-1").is_err());
    }

    #[tokio::test]
    async fn empty_update_returns_record_unchanged() {
        let controller = products();
        let created = controller
            .create(fields(json!({ "name": "Lamp", "price": 20 })))
            .await
            .unwrap();

        let updated = controller.update(created.id, Fields::new()).await.unwrap();
        assert_eq!(updated, created);
    }

    #[tokio::test]
    async fn falsy_values_keep_old_fields() {
        let controller = products();
        let created = controller
            .create(fields(json!({ "name": "Lamp", "price": 20 })))
            .await
            .unwrap();

        let updated = controller
            .update(created.id, fields(json!({ "name": "", "price": 0, "color": "red" })))
            .await
            .unwrap();

        assert_eq!(updated.get("name"), Some(&json!("Lamp")));
        assert_eq!(updated.get("price"), Some(&json!(20)));
        assert_eq!(updated.get("color"), Some(&json!("red")));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let result = products()
            .update(RecordId::new(4), fields(json!({ "name": "x" })))
            .await;
        assert!(matches!(result, Err(ControlError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let controller = products();
        let created = controller
            .create(fields(json!({ "name": "Lamp" })))
            .await
            .unwrap();

        controller.delete(created.id).await.unwrap();

        assert!(controller.get_one(created.id).await.is_err());
        assert!(matches!(
            controller.delete(created.id).await,
            Err(ControlError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn persistent_create_requires_fields() {
        let (controller, _dir) = persistent_users();
        let result = controller
            .create(fields(json!({ "name": "Ana", "age": 30 })))
            .await;

        assert!(matches!(result, Err(ControlError::BadRequest(_))));
        assert!(controller.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persistent_duplicate_email_is_bad_request() {
        let (controller, _dir) = persistent_users();
        controller
            .create(fields(json!({ "name": "Ana", "email": "a@x.com", "age": 30 })))
            .await
            .unwrap();

        let result = controller
            .create(fields(json!({ "name": "Bo", "email": "a@x.com", "age": 40 })))
            .await;

        assert!(matches!(result, Err(ControlError::BadRequest(_))));
        assert_eq!(controller.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persistent_update_with_bad_type_is_bad_request() {
        let (controller, _dir) = persistent_users();
        let created = controller
            .create(fields(json!({ "name": "Ana", "email": "a@x.com", "age": 30 })))
            .await
            .unwrap();

        let result = controller
            .update(created.id, fields(json!({ "age": "old" })))
            .await;
        assert!(matches!(result, Err(ControlError::BadRequest(_))));

        let unchanged = controller.get_one(created.id).await.unwrap();
        assert_eq!(unchanged.get("age"), Some(&json!(30)));
    }

    #[tokio::test]
    async fn persistent_update_of_unknown_id_is_not_found_before_schema() {
        let (controller, _dir) = persistent_users();
        let result = controller
            .update(RecordId::new(42), fields(json!({ "age": "old" })))
            .await;

        assert!(matches!(
            result,
            Err(ControlError::NotFound {
                kind: ResourceKind::User,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unavailable_store_is_a_store_error() {
        let controller = ResourceController::new(Arc::new(UnreachableStore));
        let id = RecordId::new(1);

        assert!(matches!(controller.list_all().await, Err(ControlError::Store(_))));
        assert!(matches!(controller.get_one(id).await, Err(ControlError::Store(_))));
        assert!(matches!(
            controller.create(fields(json!({ "name": "Ana" }))).await,
            Err(ControlError::Store(_))
        ));
        assert!(matches!(
            controller.update(id, fields(json!({ "name": "Bo" }))).await,
            Err(ControlError::Store(_))
        ));
        assert!(matches!(controller.delete(id).await, Err(ControlError::Store(_))));
    }

    #[tokio::test]
    async fn persistent_create_casts_and_drops_unknown_fields() {
        let (controller, _dir) = persistent_users();
        let record = controller
            .create(fields(
                json!({ "name": "Ana", "email": "a@x.com", "age": "30", "admin": true }),
            ))
            .await
            .unwrap();

        assert_eq!(record.get("age"), Some(&json!(30)));
        assert!(record.get("admin").is_none());
    }
}
