//! In-process [`DocumentStore`] used by handler and router tests

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{DeleteResult, Document, DocumentStore, Filter, FindOptions, UpdateResult};
use crate::error::{StoreError, StoreErrorKind, StoreOperation, StoreResult};
use crate::ids::ObjectId;

type CollectionData = BTreeMap<ObjectId, Map<String, Value>>;

/// Documents kept in ordered maps, one per collection
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    collections: Mutex<HashMap<String, CollectionData>>,
    failing: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a connection error
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent operation
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut slot) = self.inner.latency.lock() {
            *slot = Some(latency);
        }
    }

    async fn enter(&self, operation: StoreOperation) -> StoreResult<()> {
        let latency = self.inner.latency.lock().ok().and_then(|slot| *slot);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(StoreError::new(
                operation,
                StoreErrorKind::ConnectionFailed,
                "memory store is offline",
            ));
        }
        Ok(())
    }

    fn data(
        &self,
        operation: StoreOperation,
    ) -> StoreResult<MutexGuard<'_, HashMap<String, CollectionData>>> {
        self.inner.collections.lock().map_err(|_| {
            StoreError::new(operation, StoreErrorKind::Other, "memory store lock poisoned")
        })
    }

    fn to_fields<V: Serialize>(operation: StoreOperation, value: &V) -> StoreResult<Map<String, Value>> {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(other) => Err(StoreError::serialization(
                operation,
                format!("expected an object, got {}", other),
            )),
            Err(e) => Err(StoreError::serialization(operation, e.to_string())),
        }
    }

    fn decode<T: Document>(
        operation: StoreOperation,
        id: &ObjectId,
        fields: &Map<String, Value>,
    ) -> StoreResult<T> {
        let mut document = fields.clone();
        document.insert("id".to_string(), Value::String(id.to_hex()));
        serde_json::from_value(Value::Object(document))
            .map_err(|e| StoreError::serialization(operation, e.to_string()))
    }

    fn matches(filter: &Filter, fields: &Map<String, Value>) -> bool {
        match filter.condition() {
            None => true,
            Some((field, value)) => fields.get(field).and_then(Value::as_str) == Some(value),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.enter(StoreOperation::Ping).await
    }

    async fn insert_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
        document: &T,
    ) -> StoreResult<()> {
        self.enter(StoreOperation::Insert).await?;
        let fields = Self::to_fields(StoreOperation::Insert, document)?;
        let mut data = self.data(StoreOperation::Insert)?;
        let documents = data.entry(collection.to_string()).or_default();
        if documents.contains_key(id) {
            return Err(StoreError::new(
                StoreOperation::Insert,
                StoreErrorKind::QueryFailed,
                format!("record {} already exists", id),
            ));
        }
        documents.insert(*id, fields);
        Ok(())
    }

    async fn find_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
    ) -> StoreResult<Option<T>> {
        self.enter(StoreOperation::Find).await?;
        let data = self.data(StoreOperation::Find)?;
        data.get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Self::decode(StoreOperation::Find, id, fields))
            .transpose()
    }

    async fn find<T: Document>(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<T>> {
        self.enter(StoreOperation::Find).await?;
        let data = self.data(StoreOperation::Find)?;
        let Some(documents) = data.get(collection) else {
            return Ok(Vec::new());
        };

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        documents
            .iter()
            .filter(|(_, fields)| Self::matches(filter, fields))
            .skip(skip)
            .take(limit)
            .map(|(id, fields)| Self::decode(StoreOperation::Find, id, fields))
            .collect()
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.enter(StoreOperation::Count).await?;
        let data = self.data(StoreOperation::Count)?;
        let count = data
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|fields| Self::matches(filter, fields))
                    .count()
            })
            .unwrap_or_default();
        Ok(count as u64)
    }

    async fn update_one<C: Serialize + Send + Sync>(
        &self,
        collection: &str,
        id: &ObjectId,
        changes: &C,
    ) -> StoreResult<UpdateResult> {
        self.enter(StoreOperation::Update).await?;
        let changes = Self::to_fields(StoreOperation::Update, changes)?;
        let mut data = self.data(StoreOperation::Update)?;
        let Some(fields) = data.get_mut(collection).and_then(|documents| documents.get_mut(id)) else {
            return Ok(UpdateResult { matched_count: 0 });
        };
        fields.extend(changes);
        Ok(UpdateResult { matched_count: 1 })
    }

    async fn delete_one(&self, collection: &str, id: &ObjectId) -> StoreResult<DeleteResult> {
        self.enter(StoreOperation::Delete).await?;
        let mut data = self.data(StoreOperation::Delete)?;
        let removed = data
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .is_some();
        Ok(DeleteResult {
            deleted_count: u64::from(removed),
        })
    }
}
