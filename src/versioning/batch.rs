//! Batch update interception
//!
//! Every matching record is snapshotted at its own version before the
//! update is rewritten to also bump `_version`. The rewritten update is
//! first applied to a copy of each match, so an update the store would
//! reject leaves no history behind. There is no conflict check across the
//! batch, and nothing re-verifies the snapshots against the set of records
//! the live update ends up touching.

use serde_json::{Map, Value};
use tracing::debug;

use super::VersioningInterceptor;
use crate::core::BatchUpdateOp;
use crate::error::{VersioningError, VersioningResult};
use crate::identity::{document_version, require_key, VERSION_FIELD};
use crate::paths::{is_versionable, update_paths};
use crate::store::{apply_update, Document};

pub(super) async fn prepare(
    interceptor: &VersioningInterceptor,
    op: &mut BatchUpdateOp,
) -> VersioningResult<()> {
    let paths = update_paths(&op.update);
    if paths.contains(VERSION_FIELD) {
        return Err(VersioningError::invalid_document(format!(
            "batch updates may not modify {}",
            VERSION_FIELD
        )));
    }
    if !is_versionable(&paths, &interceptor.config.ignore_paths) {
        debug!(collection = %op.collection, ?paths, "only ignored paths updated, no history");
        return Ok(());
    }

    let mut update = op.update.clone();
    bump_version(&mut update)?;

    let matches = interceptor.store.find_all(&op.collection, &op.filter).await?;
    for doc in &matches {
        apply_update(&mut doc.clone(), &update)?;
    }
    for doc in &matches {
        let key = require_key(doc)?;
        let version = document_version(doc).unwrap_or(0);
        interceptor
            .snapshot(&op.collection, &key, version, doc)
            .await?;
    }
    debug!(collection = %op.collection, matched = matches.len(), "batch pre-images written");

    op.update = update;
    Ok(())
}

/// Add `$inc: { _version: 1 }`, merging into an existing `$inc`
fn bump_version(update: &mut Document) -> VersioningResult<()> {
    let inc = update
        .entry("$inc".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    match inc {
        Value::Object(fields) => {
            fields.insert(VERSION_FIELD.to_string(), Value::from(1));
            Ok(())
        }
        other => Err(VersioningError::invalid_document(format!(
            "$inc must be an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::VersioningConfig;
    use crate::core::{Mutation, MutationContext, MutationOutcome};
    use crate::store::{DocumentStore, InMemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn batch(filter: Value, update: Value) -> Mutation {
        Mutation::BatchUpdate(BatchUpdateOp {
            collection: "pages".into(),
            filter: doc(filter),
            update: doc(update),
        })
    }

    async fn seeded() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for (id, version, status) in [("a", 1, "draft"), ("b", 4, "draft"), ("c", 2, "live")] {
            store
                .insert(
                    "pages",
                    doc(json!({"_id": id, "_version": version, "status": status})),
                )
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_bump_version_merges_into_inc() {
        let mut update = doc(json!({"$inc": {"views": 2}, "$set": {"x": 1}}));
        bump_version(&mut update).unwrap();
        assert_eq!(update["$inc"], json!({"views": 2, "_version": 1}));

        let mut update = doc(json!({"$set": {"x": 1}}));
        bump_version(&mut update).unwrap();
        assert_eq!(update["$inc"], json!({"_version": 1}));

        let mut update = doc(json!({"$inc": 3}));
        assert!(bump_version(&mut update).is_err());
    }

    #[tokio::test]
    async fn test_batch_update_versions_every_match() {
        let store = seeded().await;
        let outcome = pipeline(&store, VersioningConfig::default())
            .execute(
                batch(json!({"status": "draft"}), json!({"$set": {"status": "live"}})),
                MutationContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, MutationOutcome::BatchUpdated { matched: 2 });

        let a = store.find_by_key("pages", &json!("a")).await.unwrap().unwrap();
        let b = store.find_by_key("pages", &json!("b")).await.unwrap().unwrap();
        let c = store.find_by_key("pages", &json!("c")).await.unwrap().unwrap();
        assert_eq!(a["_version"], json!(2));
        assert_eq!(b["_version"], json!(5));
        assert_eq!(c["_version"], json!(2));

        let ids: Vec<Value> = store
            .documents("versions")
            .unwrap()
            .into_iter()
            .map(|d| d["_id"].clone())
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&json!({"_id": "a", "_version": 1})));
        assert!(ids.contains(&json!({"_id": "b", "_version": 4})));
    }

    #[tokio::test]
    async fn test_ignored_batch_update_is_forwarded_unmodified() {
        let store = seeded().await;
        let config = VersioningConfig::default().with_ignore_paths(["views"]);
        pipeline(&store, config)
            .execute(batch(json!({}), json!({"$inc": {"views": 1}})), MutationContext::new())
            .await
            .unwrap();

        let a = store.find_by_key("pages", &json!("a")).await.unwrap().unwrap();
        assert_eq!(a["_version"], json!(1));
        assert_eq!(a["views"], json!(1));
        assert_eq!(store.count("versions").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_touching_version_is_rejected() {
        let store = seeded().await;
        let err = pipeline(&store, VersioningConfig::default())
            .execute(batch(json!({}), json!({"$set": {"_version": 7}})), MutationContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_DOCUMENT");
        assert_eq!(store.count("versions").unwrap(), 0);
    }

    /// Updates the store cannot apply are rejected before any pre-image.
    #[tokio::test]
    async fn test_inapplicable_update_writes_no_history() {
        let store = seeded().await;
        let pipeline = pipeline(&store, VersioningConfig::default());

        for update in [json!({"$push": {"tags": "x"}}), json!({"$inc": {"status": 1}})] {
            let err = pipeline
                .execute(batch(json!({}), update), MutationContext::new())
                .await
                .unwrap_err();
            assert_eq!(err.code(), "STORAGE_FAILURE");
        }

        assert_eq!(store.count("versions").unwrap(), 0);
        let b = store.find_by_key("pages", &json!("b")).await.unwrap().unwrap();
        assert_eq!(b["_version"], json!(4));
        assert_eq!(b["status"], json!("draft"));
    }

    #[tokio::test]
    async fn test_failed_snapshot_blocks_live_update() {
        let store = seeded().await;
        // pre-existing history for b@4 makes the second snapshot collide
        store
            .insert("versions", doc(json!({"_id": {"_id": "b", "_version": 4}, "_version": 4})))
            .await
            .unwrap();

        let err = pipeline(&store, VersioningConfig::default())
            .execute(
                batch(json!({"status": "draft"}), json!({"$set": {"status": "live"}})),
                MutationContext::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_HISTORY");

        for id in ["a", "b"] {
            let page = store.find_by_key("pages", &json!(id)).await.unwrap().unwrap();
            assert_eq!(page["status"], json!("draft"));
        }
    }
}
