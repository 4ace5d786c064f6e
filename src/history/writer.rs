//! History Writer
//!
//! The only component that writes to the history collection. Every call is
//! exactly one insert; inserts never overwrite and are never retried.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::record::HistoryRecord;
use crate::error::{VersioningError, VersioningResult};
use crate::identity::{self, ID_FIELD};
use crate::store::{Document, DocumentStore, StoreError};

#[derive(Clone)]
pub struct HistoryWriter {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl HistoryWriter {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Persist `fields` as the snapshot of `key` at `version`.
    ///
    /// # Errors
    ///
    /// - `DuplicateHistory` if `(key, version)` was already recorded
    /// - `StorageFailure` on any other store error
    pub async fn snapshot(
        &self,
        key: &Value,
        version: i64,
        fields: &Document,
    ) -> VersioningResult<HistoryRecord> {
        let record = HistoryRecord::snapshot(key.clone(), version, fields);
        self.persist(&record).await?;
        debug!(collection = %self.collection, %key, version, "history snapshot written");
        Ok(record)
    }

    /// Persist a tombstone for `key` at `version`
    pub async fn tombstone(&self, key: &Value, version: i64) -> VersioningResult<HistoryRecord> {
        let record = HistoryRecord::tombstone(key.clone(), version);
        self.persist(&record).await?;
        debug!(collection = %self.collection, %key, version, "history tombstone written");
        Ok(record)
    }

    async fn persist(&self, record: &HistoryRecord) -> VersioningResult<()> {
        match self.store.insert(&self.collection, record.to_document()).await {
            Ok(_) => Ok(()),
            Err(StoreError::DuplicateKey { .. }) => Err(VersioningError::DuplicateHistory {
                key: record.key().to_string(),
                version: record.id().version(),
            }),
            Err(e) => Err(VersioningError::StorageFailure(e.to_string())),
        }
    }

    /// Look up the record for `key` at a specific version
    pub async fn find(&self, key: &Value, version: i64) -> VersioningResult<Option<HistoryRecord>> {
        let id = identity::encode(key, version);
        let doc = self
            .store
            .find_by_key(&self.collection, &id)
            .await
            .map_err(|e| VersioningError::StorageFailure(e.to_string()))?;
        doc.map(HistoryRecord::from_document).transpose()
    }

    /// Every record for `key`, oldest first
    pub async fn versions(&self, key: &Value) -> VersioningResult<Vec<HistoryRecord>> {
        let mut filter = Document::new();
        filter.insert(format!("{}.{}", ID_FIELD, ID_FIELD), key.clone());

        let docs = self
            .store
            .find_all(&self.collection, &filter)
            .await
            .map_err(|e| VersioningError::StorageFailure(e.to_string()))?;

        let mut records = docs
            .into_iter()
            .map(HistoryRecord::from_document)
            .collect::<VersioningResult<Vec<_>>>()?;
        records.sort_by_key(|r| r.id().version());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn fields(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn writer() -> (Arc<InMemoryStore>, HistoryWriter) {
        let store = Arc::new(InMemoryStore::new());
        let writer = HistoryWriter::new(store.clone(), "versions");
        (store, writer)
    }

    #[tokio::test]
    async fn test_snapshot_is_inserted() {
        let (store, writer) = writer();
        writer
            .snapshot(&json!("p1"), 1, &fields(json!({"_id": "p1", "_version": 1, "title": "foo"})))
            .await
            .unwrap();

        assert_eq!(store.count("versions").unwrap(), 1);
        let found = writer.find(&json!("p1"), 1).await.unwrap().unwrap();
        assert_eq!(found.get("title"), Some(&json!("foo")));
        assert_eq!(found.version(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_snapshot() {
        let (store, writer) = writer();
        let f = fields(json!({"title": "foo"}));
        writer.snapshot(&json!("p1"), 1, &f).await.unwrap();

        let err = writer.snapshot(&json!("p1"), 1, &f).await.unwrap_err();
        assert_eq!(
            err,
            VersioningError::DuplicateHistory {
                key: "\"p1\"".into(),
                version: 1
            }
        );
        assert_eq!(store.count("versions").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tombstone() {
        let (_, writer) = writer();
        writer.tombstone(&json!("p1"), 2).await.unwrap();
        let found = writer.find(&json!("p1"), 2).await.unwrap().unwrap();
        assert!(found.is_tombstone());
        assert!(found.fields().is_empty());
    }

    #[tokio::test]
    async fn test_versions_are_ordered_and_scoped() {
        let (_, writer) = writer();
        let f = fields(json!({"title": "x"}));
        for v in [3, 1, 2] {
            writer.snapshot(&json!("p1"), v, &f).await.unwrap();
        }
        writer.snapshot(&json!("p2"), 1, &f).await.unwrap();

        let versions = writer.versions(&json!("p1")).await.unwrap();
        let order: Vec<i64> = versions.iter().map(|r| r.id().version()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let (_, writer) = writer();
        assert!(writer.find(&json!("nope"), 1).await.unwrap().is_none());
    }
}
