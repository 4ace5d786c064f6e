//! Save interception

use serde_json::Value;
use tracing::debug;

use super::VersioningInterceptor;
use crate::core::SaveOp;
use crate::error::{VersioningError, VersioningResult};
use crate::gate;
use crate::identity::{document_version, require_key, VERSION_FIELD};
use crate::paths::is_versionable;

/// A new record starts at version 1; nothing to preserve yet.
pub(super) fn prepare_create(op: &mut SaveOp) -> VersioningResult<()> {
    op.document
        .insert(VERSION_FIELD.to_string(), Value::from(gate::admit_new()));
    Ok(())
}

/// Snapshot the persisted record, then advance the version.
///
/// Records without a `_version` count as version 0 on both sides. Saves
/// that only touch ignored paths keep their version but still commit
/// against the version they observed, so a stale image is rejected.
pub(super) async fn prepare_update(
    interceptor: &VersioningInterceptor,
    op: &mut SaveOp,
) -> VersioningResult<()> {
    let observed = document_version(&op.document).unwrap_or(0);

    if let Some(changed) = &op.changed_paths {
        if !is_versionable(changed, &interceptor.config.ignore_paths) {
            debug!(collection = %op.collection, ?changed, "only ignored paths changed, no history");
            op.expected_version = Some(observed);
            return Ok(());
        }
    }

    let key = require_key(&op.document)?;
    let persisted = interceptor
        .store
        .find_by_key(&op.collection, &key)
        .await?
        .ok_or_else(|| VersioningError::not_found(&op.collection, &key))?;

    let current = document_version(&persisted).unwrap_or(0);
    let next = gate::check_and_advance(&op.collection, &key, Some(current), Some(observed))?;

    // a writer that passed the gate on the same version snapshotted first
    match interceptor
        .snapshot(&op.collection, &key, current, &persisted)
        .await
    {
        Err(VersioningError::DuplicateHistory { .. }) => {
            debug!(%key, current, "pre-image already recorded, save lost the race");
            return Err(VersioningError::VersionConflict {
                key: key.to_string(),
                observed: Some(observed),
                persisted: current,
            });
        }
        other => {
            other?;
        }
    }

    op.document
        .insert(VERSION_FIELD.to_string(), Value::from(next));
    op.expected_version = Some(current);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::config::VersioningConfig;
    use crate::core::{Mutation, MutationContext, MutationOutcome, SaveOp};
    use crate::error::VersioningError;
    use crate::paths::PathSet;
    use crate::store::{DocumentStore, InMemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn paths(p: &[&str]) -> PathSet {
        p.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert("pages", doc(json!({"_id": "p1", "_version": 1, "title": "foo"})))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_stamps_version_one() {
        let store = Arc::new(InMemoryStore::new());
        let outcome = pipeline(&store, VersioningConfig::default())
            .execute(
                Mutation::Create(SaveOp::new("pages", doc(json!({"_id": "p1", "_version": 9})))),
                MutationContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Created {
                key: json!("p1"),
                version: Some(1)
            }
        );
        assert_eq!(store.count("versions").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_snapshots_persisted_state() {
        let store = seeded().await;
        let update = SaveOp::new("pages", doc(json!({"_id": "p1", "_version": 1, "title": "foo 2"})))
            .with_changed_paths(paths(&["title"]));

        pipeline(&store, VersioningConfig::default())
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap();

        let live = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(live.get("_version"), Some(&json!(2)));
        assert_eq!(live.get("title"), Some(&json!("foo 2")));

        let history = store.documents("versions").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].get("_id"), Some(&json!({"_id": "p1", "_version": 1})));
        assert_eq!(history[0].get("title"), Some(&json!("foo")));
    }

    #[tokio::test]
    async fn test_ignored_paths_skip_history() {
        let store = seeded().await;
        let config = VersioningConfig::default().with_ignore_paths(["lastModified"]);
        let update = SaveOp::new(
            "pages",
            doc(json!({"_id": "p1", "_version": 1, "title": "foo", "lastModified": 5})),
        )
        .with_changed_paths(paths(&["lastModified"]));

        pipeline(&store, config)
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap();

        let live = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(live.get("_version"), Some(&json!(1)));
        assert_eq!(live.get("lastModified"), Some(&json!(5)));
        assert_eq!(store.count("versions").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_ignored_path_save_is_rejected() {
        let store = seeded().await;
        let config = VersioningConfig::default().with_ignore_paths(["lastModified"]);
        let pipeline = pipeline(&store, config);

        let winner = SaveOp::new("pages", doc(json!({"_id": "p1", "_version": 1, "title": "foo 2"})))
            .with_changed_paths(paths(&["title"]));
        pipeline
            .execute(Mutation::Update(winner), MutationContext::new())
            .await
            .unwrap();

        let stale = SaveOp::new(
            "pages",
            doc(json!({"_id": "p1", "_version": 1, "title": "foo", "lastModified": 5})),
        )
        .with_changed_paths(paths(&["lastModified"]));
        let err = pipeline
            .execute(Mutation::Update(stale), MutationContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VERSION_CONFLICT");
        let live = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(live.get("_version"), Some(&json!(2)));
        assert_eq!(live.get("title"), Some(&json!("foo 2")));
        assert_eq!(live.get("lastModified"), None);
    }

    /// A pre-image already recorded at the persisted version means another
    /// writer passed the gate first.
    #[tokio::test]
    async fn test_recorded_pre_image_reports_conflict() {
        let store = seeded().await;
        store
            .insert(
                "versions",
                doc(json!({"_id": {"_id": "p1", "_version": 1}, "_version": 1, "title": "foo"})),
            )
            .await
            .unwrap();

        let update = SaveOp::new("pages", doc(json!({"_id": "p1", "_version": 1, "title": "late"})));
        let err = pipeline(&store, VersioningConfig::default())
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VersioningError::VersionConflict {
                observed: Some(1),
                persisted: 1,
                ..
            }
        ));
        assert!(!err.is_fatal());
        let live = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(live.get("title"), Some(&json!("foo")));
        assert_eq!(live.get("_version"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_stale_version_aborts_without_history() {
        let store = seeded().await;
        let update = SaveOp::new("pages", doc(json!({"_id": "p1", "_version": 0, "title": "x"})));

        let err = pipeline(&store, VersioningConfig::default().with_log_errors(true))
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VERSION_CONFLICT");
        assert_eq!(store.count("versions").unwrap(), 0);
        let live = store.find_by_key("pages", &json!("p1")).await.unwrap().unwrap();
        assert_eq!(live.get("title"), Some(&json!("foo")));
    }

    #[tokio::test]
    async fn test_update_of_missing_record() {
        let store = Arc::new(InMemoryStore::new());
        let update = SaveOp::new("pages", doc(json!({"_id": "ghost", "_version": 1})));
        let err = pipeline(&store, VersioningConfig::default())
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unversioned_record_starts_from_zero() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert("pages", doc(json!({"_id": "legacy", "title": "old"})))
            .await
            .unwrap();

        let update = SaveOp::new("pages", doc(json!({"_id": "legacy", "title": "new"})));
        pipeline(&store, VersioningConfig::default())
            .execute(Mutation::Update(update), MutationContext::new())
            .await
            .unwrap();

        let live = store.find_by_key("pages", &json!("legacy")).await.unwrap().unwrap();
        assert_eq!(live.get("_version"), Some(&json!(1)));
        let history = store.documents("versions").unwrap();
        assert_eq!(history[0].get("_id"), Some(&json!({"_id": "legacy", "_version": 0})));
    }
}
