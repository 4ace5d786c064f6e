//! In-memory document store
//!
//! Collections are kept in a `RwLock`ed map keyed by the canonical JSON
//! encoding of each document's `_id`. Good enough for tests, the CLI and
//! embedding; not durable.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filter::matches;
use super::traits::{DocumentStore, LiveStore};
use super::update::apply_update;
use super::Document;
use crate::identity::{document_key, document_version, ID_FIELD};

/// collection -> canonical key -> document
type Collections = HashMap<String, BTreeMap<String, Document>>;

/// In-memory store for testing and embedding
pub struct InMemoryStore {
    data: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Copy of every document in a collection, ordered by key
    pub fn documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let data = self.data.read().map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(data
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        let data = self.data.read().map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(data.get(collection).map_or(0, BTreeMap::len))
    }

    /// Canonical map key for a document key.
    ///
    /// serde_json objects serialize with sorted keys, so equal keys always
    /// produce the same string.
    fn canonical(key: &Value) -> String {
        key.to_string()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_by_key(&self, collection: &str, key: &Value) -> StoreResult<Option<Document>> {
        let data = self.data.read().map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(data
            .get(collection)
            .and_then(|c| c.get(&Self::canonical(key)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<Value> {
        let key = match document_key(&document) {
            Some(key) => key.clone(),
            None => {
                let key = Value::String(uuid::Uuid::new_v4().to_string());
                document.insert(ID_FIELD.to_string(), key.clone());
                key
            }
        };

        let mut data = self.data.write().map_err(|e| StoreError::backend(e.to_string()))?;
        let coll = data.entry(collection.to_string()).or_default();
        let canonical = Self::canonical(&key);

        if coll.contains_key(&canonical) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                key: canonical,
            });
        }
        coll.insert(canonical, document);

        Ok(key)
    }

    async fn find_all(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let data = self.data.read().map_err(|e| StoreError::backend(e.to_string()))?;
        let mut results = Vec::new();
        if let Some(coll) = data.get(collection) {
            for doc in coll.values() {
                if matches(doc, filter)? {
                    results.push(doc.clone());
                }
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl LiveStore for InMemoryStore {
    async fn replace(
        &self,
        collection: &str,
        document: Document,
        expected_version: Option<i64>,
    ) -> StoreResult<()> {
        let key = document_key(&document)
            .cloned()
            .ok_or_else(|| StoreError::InvalidDocument(format!("document has no {}", ID_FIELD)))?;
        let canonical = Self::canonical(&key);

        let mut data = self.data.write().map_err(|e| StoreError::backend(e.to_string()))?;
        let existing = data
            .get_mut(collection)
            .and_then(|c| c.get_mut(&canonical))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: canonical.clone(),
            })?;

        if let Some(expected) = expected_version {
            let found = document_version(existing).unwrap_or(0);
            if found != expected {
                return Err(StoreError::VersionMismatch {
                    key: canonical,
                    expected,
                    found,
                });
            }
        }

        *existing = document;
        Ok(())
    }

    async fn remove(&self, collection: &str, key: &Value) -> StoreResult<bool> {
        let mut data = self.data.write().map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(data
            .get_mut(collection)
            .map_or(false, |c| c.remove(&Self::canonical(key)).is_some()))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
    ) -> StoreResult<u64> {
        let mut data = self.data.write().map_err(|e| StoreError::backend(e.to_string()))?;
        let coll = match data.get_mut(collection) {
            Some(coll) => coll,
            None => return Ok(0),
        };

        // Stage every change first so a bad update leaves the collection untouched
        let mut staged = Vec::new();
        for (canonical, doc) in coll.iter() {
            if matches(doc, filter)? {
                let mut next = doc.clone();
                apply_update(&mut next, update)?;
                staged.push((canonical.clone(), next));
            }
        }

        let count = staged.len() as u64;
        for (canonical, doc) in staged {
            coll.insert(canonical, doc);
        }
        Ok(count)
    }

    async fn remove_many(&self, collection: &str, filter: &Document) -> StoreResult<u64> {
        let mut data = self.data.write().map_err(|e| StoreError::backend(e.to_string()))?;
        let coll = match data.get_mut(collection) {
            Some(coll) => coll,
            None => return Ok(0),
        };

        let mut doomed = Vec::new();
        for (canonical, doc) in coll.iter() {
            if matches(doc, filter)? {
                doomed.push(canonical.clone());
            }
        }
        for canonical in &doomed {
            coll.remove(canonical);
        }
        Ok(doomed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryStore::new();
        let key = store
            .insert("pages", doc(json!({"_id": "p1", "title": "foo"})))
            .await
            .unwrap();
        assert_eq!(key, json!("p1"));

        let found = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(found["title"], "foo");
        assert!(store.find_by_key("pages", &json!("p2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_generates_key() {
        let store = InMemoryStore::new();
        let key = store.insert("pages", doc(json!({"title": "foo"}))).await.unwrap();
        assert!(key.is_string());
        let found = store.find_by_key("pages", &key).await.unwrap().unwrap();
        assert_eq!(found[ID_FIELD], key);
    }

    #[tokio::test]
    async fn test_insert_never_overwrites() {
        let store = InMemoryStore::new();
        let id = json!({"_id": "p1", "_version": 1});
        store
            .insert("versions", doc(json!({"_id": id.clone(), "title": "a"})))
            .await
            .unwrap();
        let err = store
            .insert("versions", doc(json!({"_id": id.clone(), "title": "b"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let kept = store.find_by_key("versions", &id).await.unwrap().unwrap();
        assert_eq!(kept["title"], "a");
    }

    #[tokio::test]
    async fn test_conditional_replace() {
        let store = InMemoryStore::new();
        store
            .insert("pages", doc(json!({"_id": "p1", "_version": 1})))
            .await
            .unwrap();

        let err = store
            .replace("pages", doc(json!({"_id": "p1", "_version": 3})), Some(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionMismatch {
                key: "\"p1\"".into(),
                expected: 2,
                found: 1
            }
        );

        store
            .replace("pages", doc(json!({"_id": "p1", "_version": 2})), Some(1))
            .await
            .unwrap();
        let found = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(found["_version"], 2);
    }

    #[tokio::test]
    async fn test_replace_missing() {
        let store = InMemoryStore::new();
        let err = store
            .replace("pages", doc(json!({"_id": "nope"})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_many_and_remove_many() {
        let store = InMemoryStore::new();
        for i in 0..4 {
            store
                .insert("posts", doc(json!({"_id": i, "draft": i % 2 == 0, "n": 0})))
                .await
                .unwrap();
        }

        let filter = doc(json!({"draft": true}));
        let updated = store
            .update_many("posts", &filter, &doc(json!({"$inc": {"n": 1}})))
            .await
            .unwrap();
        assert_eq!(updated, 2);
        let drafts = store.find_all("posts", &filter).await.unwrap();
        assert!(drafts.iter().all(|d| d["n"] == 1));

        assert_eq!(store.remove_many("posts", &filter).await.unwrap(), 2);
        assert_eq!(store.count("posts").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_many_is_all_or_nothing() {
        let store = InMemoryStore::new();
        store.insert("c", doc(json!({"_id": 1, "n": 1}))).await.unwrap();
        store.insert("c", doc(json!({"_id": 2, "n": "x"}))).await.unwrap();

        let res = store
            .update_many("c", &Document::new(), &doc(json!({"$inc": {"n": 1}})))
            .await;
        assert!(res.is_err());

        let one = store.find_by_key("c", &json!(1)).await.unwrap().unwrap();
        assert_eq!(one["n"], 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryStore::new();
        store.insert("c", doc(json!({"_id": "a"}))).await.unwrap();
        assert!(store.remove("c", &json!("a")).await.unwrap());
        assert!(!store.remove("c", &json!("a")).await.unwrap());
    }
}
