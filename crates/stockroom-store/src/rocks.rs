//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `ResourceStore`
//! trait. Every operation is an independent round trip executed on the
//! blocking thread pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use stockroom_core::{RecordId, ResourceKind};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::model::RecordSchema;
use crate::schema::{all_column_families, cf, records_cf};
use crate::types::{without_id, Fields, Patch, Record};
use crate::ResourceStore;

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed document store for one resource kind.
///
/// Handles for several kinds may share one database; see [`RocksStore::for_kind`].
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<Db>,
    kind: ResourceKind,
    schema: Option<RecordSchema>,
    /// Serializes mutations so unique checks and id allocation are atomic.
    write_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path and return the
    /// store for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P, kind: ResourceKind) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            kind,
            schema: RecordSchema::for_kind(kind),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// A store for another kind sharing this database handle.
    #[must_use]
    pub fn for_kind(&self, kind: ResourceKind) -> Self {
        Self {
            db: Arc::clone(&self.db),
            kind,
            schema: RecordSchema::for_kind(kind),
            write_lock: Arc::clone(&self.write_lock),
        }
    }

    /// Run a blocking operation on a clone of this handle.
    async fn round_trip<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || op(&this))
            .await
            .map_err(|e| StoreError::Unavailable(format!("store task failed: {e}")))?
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Unavailable(format!("column family not found: {name}")))
    }

    /// Serialize a document using CBOR.
    fn serialize(fields: &Fields) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(fields, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a document from CBOR.
    fn deserialize(data: &[u8]) -> Result<Fields> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_document(&self, id: RecordId) -> Result<Option<Fields>> {
        let cf = self.cf(records_cf(self.kind))?;
        self.db
            .get_cf(&cf, keys::record_key(id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn next_id(&self) -> Result<RecordId> {
        let cf_meta = self.cf(cf::META)?;
        match self.db.get_cf(&cf_meta, keys::counter_key(self.kind))? {
            Some(bytes) => RecordId::from_be_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(RecordId::FIRST),
        }
    }

    /// Fail if another record already holds a unique value of `document`.
    fn check_unique(&self, document: &Fields, owner: Option<RecordId>) -> Result<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let cf_unique = self.cf(cf::UNIQUE)?;
        for rule in schema.unique_fields() {
            let Some(value) = document.get(rule.name) else {
                continue;
            };
            let key = keys::unique_key(self.kind, rule.name, value);
            if let Some(existing) = self.db.get_cf(&cf_unique, key)? {
                let existing = RecordId::from_be_slice(&existing)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                if Some(existing) != owner {
                    tracing::debug!(
                        kind = %self.kind,
                        field = rule.name,
                        existing = %existing,
                        "Unique field collision"
                    );
                    return Err(StoreError::Conflict {
                        field: rule.name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Stage index updates moving unique entries from `old` to `new`.
    fn stage_unique_index(
        &self,
        batch: &mut WriteBatch,
        id: RecordId,
        old: Option<&Fields>,
        new: Option<&Fields>,
    ) -> Result<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let cf_unique = self.cf(cf::UNIQUE)?;
        for rule in schema.unique_fields() {
            let before = old.and_then(|doc| doc.get(rule.name));
            let after = new.and_then(|doc| doc.get(rule.name));
            if before == after {
                continue;
            }
            if let Some(value) = before {
                batch.delete_cf(&cf_unique, keys::unique_key(self.kind, rule.name, value));
            }
            if let Some(value) = after {
                batch.put_cf(
                    &cf_unique,
                    keys::unique_key(self.kind, rule.name, value),
                    id.to_be_bytes(),
                );
            }
        }
        Ok(())
    }

    fn list_blocking(&self) -> Result<Vec<Record>> {
        let cf = self.cf(records_cf(self.kind))?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item?;
            let id = keys::record_id_from_key(&key)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            records.push(Record {
                id,
                fields: Self::deserialize(&value)?,
            });
        }

        Ok(records)
    }

    fn insert_blocking(&self, fields: Fields) -> Result<Record> {
        let _guard = self.write_lock.lock();

        let document = match &self.schema {
            Some(schema) => schema.conform(&fields)?,
            None => without_id(fields),
        };
        self.check_unique(&document, None)?;

        let id = self.next_id()?;
        let cf_records = self.cf(records_cf(self.kind))?;
        let cf_meta = self.cf(cf::META)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_records, keys::record_key(id), Self::serialize(&document)?);
        batch.put_cf(&cf_meta, keys::counter_key(self.kind), id.next().to_be_bytes());
        self.stage_unique_index(&mut batch, id, None, Some(&document))?;
        self.db.write(batch)?;

        Ok(Record {
            id,
            fields: document,
        })
    }

    fn update_blocking(&self, id: RecordId, patch: &Patch) -> Result<Option<Record>> {
        let _guard = self.write_lock.lock();

        let Some(old) = self.get_document(id)? else {
            return Ok(None);
        };
        let patch = match &self.schema {
            Some(schema) => schema.conform_patch(patch)?,
            None => patch.clone(),
        };

        let mut document = old.clone();
        patch.apply(&mut document);
        self.check_unique(&document, Some(id))?;

        let cf_records = self.cf(records_cf(self.kind))?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_records, keys::record_key(id), Self::serialize(&document)?);
        self.stage_unique_index(&mut batch, id, Some(&old), Some(&document))?;
        self.db.write(batch)?;

        Ok(Some(Record {
            id,
            fields: document,
        }))
    }

    fn remove_blocking(&self, id: RecordId) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let Some(old) = self.get_document(id)? else {
            return Ok(false);
        };

        let cf_records = self.cf(records_cf(self.kind))?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_records, keys::record_key(id));
        self.stage_unique_index(&mut batch, id, Some(&old), None)?;
        self.db.write(batch)?;

        Ok(true)
    }
}

#[async_trait]
impl ResourceStore for RocksStore {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn schema(&self) -> Option<&RecordSchema> {
        self.schema.as_ref()
    }

    async fn list(&self) -> Result<Vec<Record>> {
        self.round_trip(Self::list_blocking).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>> {
        self.round_trip(move |store| {
            Ok(store
                .get_document(id)?
                .map(|fields| Record { id, fields }))
        })
        .await
    }

    async fn insert(&self, fields: Fields) -> Result<Record> {
        self.round_trip(move |store| store.insert_blocking(fields))
            .await
    }

    async fn update(&self, id: RecordId, patch: Patch) -> Result<Option<Record>> {
        self.round_trip(move |store| store.update_blocking(id, &patch))
            .await
    }

    async fn remove(&self, id: RecordId) -> Result<bool> {
        self.round_trip(move |store| store.remove_blocking(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path(), ResourceKind::User).unwrap();
        (store, dir)
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn user(name: &str, email: &str, age: u32) -> Fields {
        fields(json!({"name": name, "email": email, "age": age}))
    }

    #[tokio::test]
    async fn user_crud() {
        let (store, _dir) = create_test_store();

        // Create
        let record = store.insert(user("Ana", "a@x.com", 30)).await.unwrap();
        assert_eq!(record.id, RecordId::FIRST);

        // Read
        let retrieved = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(retrieved, record);

        // Update
        let patch = Patch::from_supplied(fields(json!({"age": 31})));
        let updated = store.update(record.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.fields["age"], json!(31));
        assert_eq!(updated.fields["name"], json!("Ana"));

        // Delete
        assert!(store.remove(record.id).await.unwrap());
        assert!(store.find_by_id(record.id).await.unwrap().is_none());
        assert!(!store.remove(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn schema_violations_are_rejected() {
        let (store, _dir) = create_test_store();
        let result = store.insert(fields(json!({"name": "Ana", "age": 30}))).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (store, _dir) = create_test_store();
        store.insert(user("Ana", "a@x.com", 30)).await.unwrap();

        let result = store.insert(user("Bea", "a@x.com", 41)).await;
        assert!(matches!(result, Err(StoreError::Conflict { ref field }) if field == "email"));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let (store, _dir) = create_test_store();
        store.insert(user("Ana", "a@x.com", 30)).await.unwrap();
        let bea = store.insert(user("Bea", "b@x.com", 41)).await.unwrap();

        let patch = Patch::from_supplied(fields(json!({"email": "a@x.com"})));
        let result = store.update(bea.id, patch).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let unchanged = store.find_by_id(bea.id).await.unwrap().unwrap();
        assert_eq!(unchanged.fields["email"], json!("b@x.com"));
    }

    #[tokio::test]
    async fn freed_email_can_be_reused() {
        let (store, _dir) = create_test_store();
        let ana = store.insert(user("Ana", "a@x.com", 30)).await.unwrap();

        let patch = Patch::from_supplied(fields(json!({"email": "ana@x.com"})));
        store.update(ana.id, patch).await.unwrap().unwrap();
        store.insert(user("Bea", "a@x.com", 41)).await.unwrap();

        assert!(store.remove(ana.id).await.unwrap());
        store.insert(user("Cai", "ana@x.com", 22)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ids_survive_reopen_and_are_not_reused() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(dir.path(), ResourceKind::User).unwrap();
            store.insert(user("Ana", "a@x.com", 30)).await.unwrap();
            let bea = store.insert(user("Bea", "b@x.com", 41)).await.unwrap();
            assert!(store.remove(bea.id).await.unwrap());
        }

        let store = RocksStore::open(dir.path(), ResourceKind::User).unwrap();
        let cai = store.insert(user("Cai", "c@x.com", 22)).await.unwrap();
        assert_eq!(cai.id, RecordId::new(3));

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, [1, 3]);
    }

    #[tokio::test]
    async fn kinds_are_isolated() {
        let (users, _dir) = create_test_store();
        let products = users.for_kind(ResourceKind::Product);

        users.insert(user("Ana", "a@x.com", 30)).await.unwrap();
        let lamp = products
            .insert(fields(json!({"name": "Lamp", "price": 12.5})))
            .await
            .unwrap();

        assert_eq!(lamp.id, RecordId::FIRST);
        assert_eq!(lamp.fields["price"], json!(12.5));
        assert_eq!(users.list().await.unwrap().len(), 1);
        assert_eq!(products.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let (store, _dir) = create_test_store();
        for i in 0..12 {
            store
                .insert(user("n", &format!("{i}@x.com"), i))
                .await
                .unwrap();
        }
        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }
}
