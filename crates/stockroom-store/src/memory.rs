//! In-memory storage implementation.

use async_trait::async_trait;
use parking_lot::Mutex;

use stockroom_core::{RecordId, ResourceKind};

use crate::error::Result;
use crate::types::{without_id, Fields, Patch, Record};
use crate::ResourceStore;

/// A process-local store backed by a `Vec`.
///
/// Every operation takes the lock for its full duration, so concurrent
/// requests observe each mutation as a single step.
pub struct MemoryStore {
    kind: ResourceKind,
    inner: Mutex<Inner>,
}

struct Inner {
    records: Vec<Record>,
    next_id: RecordId,
}

impl MemoryStore {
    /// Create an empty store for `kind`.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(Inner {
                records: Vec::new(),
                next_id: RecordId::FIRST,
            }),
        }
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.inner.lock().records.clone())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>> {
        let inner = self.inner.lock();
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, fields: Fields) -> Result<Record> {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id = id.next();

        let record = Record {
            id,
            fields: without_id(fields),
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: Patch) -> Result<Option<Record>> {
        let mut inner = self.inner.lock();
        let Some(record) = inner.records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        patch.apply(&mut record.fields);
        Ok(Some(record.clone()))
    }

    async fn remove(&self, id: RecordId) -> Result<bool> {
        let mut inner = self.inner.lock();
        let Some(index) = inner.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        inner.records.remove(index);
        Ok(true)
    }
}
