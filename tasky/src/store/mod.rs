//! Document store abstraction
//!
//! [`DocumentStore`] is the seam between request handlers and the database
//! driver. Documents are addressed by collection name and [`ObjectId`];
//! [`Collections`] resolves one typed [`CollectionHandle`] per collection at
//! startup, and every operation issued through a handle runs under a deadline.
//!
//! ```rust,ignore
//! let collections = Collections::resolve(&store, Duration::from_secs(10));
//! let id = collections.tasks.insert_one(task).await?;
//! let found = collections.tasks.find_one(&id).await?;
//! ```

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use crate::error::{StoreError, StoreOperation, StoreResult};
use crate::ids::ObjectId;
use crate::models::{Task, User};

#[cfg(test)]
pub mod memory;
pub mod surreal;

#[cfg(test)]
pub use memory::MemoryStore;
pub use surreal::SurrealStore;

/// A type stored as a document in a named collection
///
/// The document's identifier is not part of its stored content; stores
/// report it back in the `id` field when reading.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the document lives in
    const COLLECTION: &'static str;

    /// Stored field names, excluding `id`
    const FIELDS: &'static [&'static str];
}

/// Equality filter on a single string-valued field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    condition: Option<(&'static str, String)>,
}

impl Filter {
    /// Match every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Match documents whose `field` equals `value`
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            condition: Some((field, value.into())),
        }
    }

    /// The field/value pair, if any
    pub fn condition(&self) -> Option<(&'static str, &str)> {
        self.condition
            .as_ref()
            .map(|(field, value)| (*field, value.as_str()))
    }
}

/// Skip/limit applied to a find, results are ordered by identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Documents to skip
    pub skip: u64,
    /// Maximum documents to return, `None` for no limit
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Skip the first `skip` documents
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Return at most `limit` documents
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }
}

/// Outcome of an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matched by the identifier
    pub matched_count: u64,
}

/// Outcome of a delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Documents removed
    pub deleted_count: u64,
}

/// Operations a document database must provide
///
/// Implementations are cheap to clone and shared across requests.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Round-trip to the database
    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Store `document` under `id`
    fn insert_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
        document: &T,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Fetch the document stored under `id`
    fn find_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
    ) -> impl Future<Output = StoreResult<Option<T>>> + Send;

    /// Fetch matching documents ordered by identifier
    fn find<T: Document>(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> impl Future<Output = StoreResult<Vec<T>>> + Send;

    /// Count matching documents
    fn count_documents(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Overwrite the fields present in `changes` on the document stored under `id`
    fn update_one<C: Serialize + Send + Sync>(
        &self,
        collection: &str,
        id: &ObjectId,
        changes: &C,
    ) -> impl Future<Output = StoreResult<UpdateResult>> + Send;

    /// Remove the document stored under `id`
    fn delete_one(
        &self,
        collection: &str,
        id: &ObjectId,
    ) -> impl Future<Output = StoreResult<DeleteResult>> + Send;
}

/// Typed access to one collection with a per-operation deadline
pub struct CollectionHandle<S, T> {
    store: S,
    timeout: Duration,
    _document: PhantomData<fn() -> T>,
}

impl<S: Clone, T> Clone for CollectionHandle<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
            _document: PhantomData,
        }
    }
}

impl<S: DocumentStore, T: Document> CollectionHandle<S, T> {
    /// Resolve the handle for `T`'s collection
    pub fn resolve(store: &S, timeout: Duration) -> Self {
        Self {
            store: store.clone(),
            timeout,
            _document: PhantomData,
        }
    }

    /// Collection name
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    /// Insert a document under a freshly generated identifier
    pub async fn insert_one(&self, document: &T) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        self.bounded(
            StoreOperation::Insert,
            self.store.insert_one(T::COLLECTION, &id, document),
        )
        .await?;
        Ok(id)
    }

    /// Fetch one document by identifier
    pub async fn find_one(&self, id: &ObjectId) -> StoreResult<Option<T>> {
        self.bounded(
            StoreOperation::Find,
            self.store.find_one(T::COLLECTION, id),
        )
        .await
    }

    /// Fetch matching documents ordered by identifier
    pub async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<T>> {
        self.bounded(
            StoreOperation::Find,
            self.store.find(T::COLLECTION, filter, options),
        )
        .await
    }

    /// Count matching documents
    pub async fn count_documents(&self, filter: &Filter) -> StoreResult<u64> {
        self.bounded(
            StoreOperation::Count,
            self.store.count_documents(T::COLLECTION, filter),
        )
        .await
    }

    /// Overwrite fields on one document
    pub async fn update_one<C: Serialize + Send + Sync>(
        &self,
        id: &ObjectId,
        changes: &C,
    ) -> StoreResult<UpdateResult> {
        self.bounded(
            StoreOperation::Update,
            self.store.update_one(T::COLLECTION, id, changes),
        )
        .await
    }

    /// Remove one document
    pub async fn delete_one(&self, id: &ObjectId) -> StoreResult<DeleteResult> {
        self.bounded(
            StoreOperation::Delete,
            self.store.delete_one(T::COLLECTION, id),
        )
        .await
    }

    async fn bounded<R>(
        &self,
        operation: StoreOperation,
        call: impl Future<Output = StoreResult<R>>,
    ) -> StoreResult<R> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| e.in_collection(T::COLLECTION)),
            Err(_) => Err(StoreError::timeout(operation, self.timeout).in_collection(T::COLLECTION)),
        }
    }
}

/// The collection handles used by the service, resolved once at startup
pub struct Collections<S> {
    /// `users` collection
    pub users: CollectionHandle<S, User>,
    /// `tasks` collection
    pub tasks: CollectionHandle<S, Task>,
}

impl<S: Clone> Clone for Collections<S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

impl<S: DocumentStore> Collections<S> {
    /// Resolve every collection against a connected store
    pub fn resolve(store: &S, timeout: Duration) -> Self {
        let collections = Self {
            users: CollectionHandle::resolve(store, timeout),
            tasks: CollectionHandle::resolve(store, timeout),
        };
        tracing::debug!(
            users = collections.users.name(),
            tasks = collections.tasks.name(),
            timeout_ms = timeout.as_millis() as u64,
            "Collections resolved"
        );
        collections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;

    fn task(title: &str, user_id: ObjectId) -> Task {
        Task {
            id: None,
            title: title.to_string(),
            description: String::new(),
            completed: false,
            user_id,
        }
    }

    #[test]
    fn test_filter_condition() {
        assert_eq!(Filter::all().condition(), None);
        assert_eq!(
            Filter::eq("userId", "abc").condition(),
            Some(("userId", "abc"))
        );
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::default().skip(5).limit(Some(5));
        assert_eq!(options.skip, 5);
        assert_eq!(options.limit, Some(5));
    }

    #[tokio::test]
    async fn test_handle_assigns_identifier_and_reads_back() {
        let store = MemoryStore::new();
        let collections = Collections::resolve(&store, Duration::from_secs(10));
        let owner = ObjectId::new();

        let id = collections.tasks.insert_one(&task("write tests", owner)).await.unwrap();
        let found = collections.tasks.find_one(&id).await.unwrap().unwrap();

        assert_eq!(found.id, Some(id));
        assert_eq!(found.title, "write tests");
        assert_eq!(found.user_id, owner);
        assert_eq!(collections.tasks.name(), "tasks");
        assert_eq!(collections.users.name(), "users");
    }

    #[tokio::test]
    async fn test_handle_tags_errors_with_collection() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let collections = Collections::resolve(&store, Duration::from_secs(10));

        let err = collections.users.count_documents(&Filter::all()).await.unwrap_err();
        assert_eq!(err.collection.as_deref(), Some("users"));
        assert_eq!(err.kind, StoreErrorKind::ConnectionFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_enforces_deadline() {
        let store = MemoryStore::new();
        store.set_latency(Duration::from_secs(30));
        let collections = Collections::resolve(&store, Duration::from_secs(10));

        let err = collections.tasks.find_one(&ObjectId::new()).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Timeout);
        assert_eq!(err.operation, StoreOperation::Find);
        assert_eq!(err.collection.as_deref(), Some("tasks"));
    }
}
