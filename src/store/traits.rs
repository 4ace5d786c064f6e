//! Store traits

use async_trait::async_trait;
use serde_json::Value;

use super::errors::StoreResult;
use super::Document;

/// Read-by-key, insert and filtered scan: everything the versioning core
/// needs from a store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document by primary key
    async fn find_by_key(&self, collection: &str, key: &Value) -> StoreResult<Option<Document>>;

    /// Insert a new document, returning its key.
    ///
    /// Fails with `DuplicateKey` if the key already exists; never overwrites.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Value>;

    /// Fetch every document matching a filter
    async fn find_all(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>>;
}

/// Write surface the host uses to commit live mutations.
#[async_trait]
pub trait LiveStore: DocumentStore {
    /// Replace a document by its `_id`.
    ///
    /// With `expected_version`, the replace only happens if the persisted
    /// `_version` still equals it (`VersionMismatch` otherwise).
    async fn replace(
        &self,
        collection: &str,
        document: Document,
        expected_version: Option<i64>,
    ) -> StoreResult<()>;

    /// Remove a document by key, returning whether it existed
    async fn remove(&self, collection: &str, key: &Value) -> StoreResult<bool>;

    /// Apply an update document to every matching document, returning the count
    async fn update_many(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
    ) -> StoreResult<u64>;

    /// Remove every matching document, returning the count
    async fn remove_many(&self, collection: &str, filter: &Document) -> StoreResult<u64>;
}
