//! Versioned collections
//!
//! `VersionedCollection` wires one live collection to its store, its
//! history writer and a pipeline of observe + versioning interceptors.
//! Callers work with `TrackedDocument`s; changed paths are computed for
//! them on save.

mod document;

pub use document::TrackedDocument;

use std::sync::Arc;

use serde_json::Value;

use crate::config::VersioningConfig;
use crate::core::{
    BatchDeleteOp, BatchUpdateOp, DeleteOp, Mutation, MutationContext, MutationOutcome,
    MutationResult, MutationStats, ObserveInterceptor, Pipeline, PipelineBuilder, SaveOp,
    StatsSnapshot, StoreExecutor,
};
use crate::error::{VersioningError, VersioningResult};
use crate::history::{HistoryRecord, HistoryWriter};
use crate::identity::{ID_FIELD, VERSION_FIELD};
use crate::schema::Schema;
use crate::store::{Document, LiveStore};
use crate::versioning::VersioningInterceptor;

pub struct VersionedCollection<S> {
    name: String,
    store: Arc<S>,
    history: HistoryWriter,
    pipeline: Pipeline,
    stats: Arc<MutationStats>,
}

impl<S: LiveStore + 'static> VersionedCollection<S> {
    pub fn new(
        name: impl Into<String>,
        store: Arc<S>,
        config: VersioningConfig,
    ) -> VersioningResult<Self> {
        Self::build(name.into(), store, config, None)
    }

    /// Collection named after `schema`, with snapshots projected onto the
    /// history schema derived from it
    pub fn with_schema(
        store: Arc<S>,
        config: VersioningConfig,
        schema: Schema,
    ) -> VersioningResult<Self> {
        Self::build(schema.name.clone(), store, config, Some(schema))
    }

    fn build(
        name: String,
        store: Arc<S>,
        config: VersioningConfig,
        schema: Option<Schema>,
    ) -> VersioningResult<Self> {
        let mut versioning = VersioningInterceptor::new(store.clone(), config)?;
        if let Some(schema) = schema {
            versioning = versioning.with_schema(schema)?;
        }
        let history = versioning.history().clone();

        let observe = ObserveInterceptor::new();
        let stats = observe.stats();

        let pipeline = PipelineBuilder::new()
            .with(observe)
            .with(versioning)
            .build(StoreExecutor::new(store.clone()));

        Ok(Self {
            name,
            store,
            history,
            pipeline,
            stats,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn history_collection(&self) -> &str {
        self.history.collection()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Unsaved document; `save` will create it
    pub fn new_document(&self, fields: Document) -> TrackedDocument {
        TrackedDocument::new(fields)
    }

    /// Create and save a new record
    pub async fn create(&self, fields: Document) -> VersioningResult<TrackedDocument> {
        let mut doc = self.new_document(fields);
        self.save(&mut doc).await?;
        Ok(doc)
    }

    pub async fn load(&self, key: &Value) -> VersioningResult<Option<TrackedDocument>> {
        let doc = self.store.find_by_key(&self.name, key).await?;
        Ok(doc.map(TrackedDocument::from_persisted))
    }

    pub async fn find(&self, filter: &Document) -> VersioningResult<Vec<Document>> {
        Ok(self.store.find_all(&self.name, filter).await?)
    }

    /// Create or update `doc`. On success `doc` holds the committed image,
    /// including its new `_version`.
    pub async fn save(&self, doc: &mut TrackedDocument) -> VersioningResult<MutationOutcome> {
        let op = SaveOp::new(&self.name, doc.data().clone());
        let mutation = if doc.is_new() {
            Mutation::Create(op)
        } else {
            Mutation::Update(op.with_changed_paths(doc.modified_paths()))
        };

        let outcome = self.run(mutation).await?;

        let mut committed = doc.data().clone();
        if let MutationOutcome::Created { key, version } | MutationOutcome::Updated { key, version } =
            &outcome
        {
            committed.insert(ID_FIELD.to_string(), key.clone());
            if let Some(version) = version {
                committed.insert(VERSION_FIELD.to_string(), Value::from(*version));
            }
        }
        doc.mark_persisted(committed);
        Ok(outcome)
    }

    /// Delete a loaded record; its image becomes the final snapshot
    pub async fn delete(&self, doc: TrackedDocument) -> VersioningResult<MutationOutcome> {
        if doc.is_new() {
            return Err(VersioningError::invalid_document(
                "cannot delete a document that was never saved",
            ));
        }
        self.run(Mutation::Delete(DeleteOp {
            collection: self.name.clone(),
            document: doc.into_document(),
        }))
        .await
    }

    /// Load and delete a record by key
    pub async fn delete_by_key(&self, key: &Value) -> VersioningResult<MutationOutcome> {
        match self.load(key).await? {
            Some(doc) => self.delete(doc).await,
            None => Err(VersioningError::not_found(&self.name, key)),
        }
    }

    /// Batch update, returning the number of matched records
    pub async fn update_many(&self, filter: Document, update: Document) -> VersioningResult<u64> {
        let outcome = self
            .run(Mutation::BatchUpdate(BatchUpdateOp {
                collection: self.name.clone(),
                filter,
                update,
            }))
            .await?;
        match outcome {
            MutationOutcome::BatchUpdated { matched } => Ok(matched),
            other => Err(unexpected(other)),
        }
    }

    /// Batch delete; only allowed with `ignore_missing_hooks`
    pub async fn delete_many(&self, filter: Document) -> VersioningResult<u64> {
        let outcome = self
            .run(Mutation::BatchDelete(BatchDeleteOp {
                collection: self.name.clone(),
                filter,
            }))
            .await?;
        match outcome {
            MutationOutcome::BatchDeleted { removed } => Ok(removed),
            other => Err(unexpected(other)),
        }
    }

    /// Every historical record of `key`, oldest first
    pub async fn history(&self, key: &Value) -> VersioningResult<Vec<HistoryRecord>> {
        self.history.versions(key).await
    }

    /// The historical record of `key` at `version`
    pub async fn version_at(
        &self,
        key: &Value,
        version: i64,
    ) -> VersioningResult<Option<HistoryRecord>> {
        self.history.find(key, version).await
    }

    /// Run a raw mutation against this collection
    pub async fn execute(&self, mutation: Mutation) -> MutationResult {
        if mutation.collection() != self.name {
            return Err(VersioningError::invalid_document(format!(
                "mutation targets {}, expected {}",
                mutation.collection(),
                self.name
            )));
        }
        self.run(mutation).await
    }

    async fn run(&self, mutation: Mutation) -> MutationResult {
        self.pipeline.execute(mutation, MutationContext::new()).await
    }
}

fn unexpected(outcome: MutationOutcome) -> VersioningError {
    VersioningError::StorageFailure(format!("unexpected outcome {:?}", outcome))
}
