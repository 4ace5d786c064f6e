//! # Versioning Interceptor
//!
//! Runs before every live mutation commits and preserves the record's prior
//! state in the history collection:
//!
//! - create: stamps `_version = 1`, writes no history
//! - update: gates on the observed version, snapshots the persisted record,
//!   then advances `_version`
//! - delete: snapshots the record, then writes a tombstone
//! - batch update: snapshots every match, then adds `$inc: {_version: 1}`
//! - batch delete: no versioning support; forwarded or rejected per
//!   `ignore_missing_hooks`
//!
//! Any failure aborts the mutation before it reaches the live store.

mod batch;
mod delete;
mod save;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::config::VersioningConfig;
use crate::core::{Interceptor, Mutation, MutationContext, MutationResult, Next};
use crate::error::{VersioningError, VersioningResult};
use crate::history::{HistoryRecord, HistoryWriter};
use crate::schema::{Schema, SchemaRegistry};
use crate::store::{Document, DocumentStore};

pub struct VersioningInterceptor {
    /// Live collection reads
    store: Arc<dyn DocumentStore>,
    history: HistoryWriter,
    config: VersioningConfig,
    schemas: SchemaRegistry,
}

impl VersioningInterceptor {
    /// Live reads and history writes both go to `store`.
    pub fn new(store: Arc<dyn DocumentStore>, config: VersioningConfig) -> VersioningResult<Self> {
        let history = HistoryWriter::new(Arc::clone(&store), config.history_collection_name.clone());
        Self::with_history_store(store, history, config)
    }

    /// Keep history in a separate store.
    pub fn with_history_store(
        store: Arc<dyn DocumentStore>,
        history: HistoryWriter,
        config: VersioningConfig,
    ) -> VersioningResult<Self> {
        config.validate()?;
        if history.collection() != config.history_collection_name {
            return Err(VersioningError::config(format!(
                "history writer targets {}, config names {}",
                history.collection(),
                config.history_collection_name
            )));
        }
        Ok(Self {
            store,
            history,
            config,
            schemas: SchemaRegistry::new(),
        })
    }

    /// Register a live schema; snapshots of that collection are projected
    /// onto the derived history schema.
    pub fn with_schema(mut self, live: Schema) -> VersioningResult<Self> {
        self.schemas
            .register(live, &self.config.history_collection_name)?;
        Ok(self)
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryWriter {
        &self.history
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Write a snapshot, projected through the collection's history schema
    /// if one is registered.
    async fn snapshot(
        &self,
        collection: &str,
        key: &Value,
        version: i64,
        fields: &Document,
    ) -> VersioningResult<HistoryRecord> {
        match self.schemas.history(collection) {
            Some(schema) => {
                self.history
                    .snapshot(key, version, &schema.project(fields))
                    .await
            }
            None => self.history.snapshot(key, version, fields).await,
        }
    }

    async fn prepare(&self, mutation: &mut Mutation) -> VersioningResult<()> {
        match mutation {
            Mutation::Create(op) => save::prepare_create(op),
            Mutation::Update(op) => save::prepare_update(self, op).await,
            Mutation::Delete(op) => delete::prepare(self, op).await,
            Mutation::BatchUpdate(op) => batch::prepare(self, op).await,
            Mutation::BatchDelete(op) => {
                if self.config.ignore_missing_hooks {
                    debug!(collection = %op.collection, "batch delete forwarded without history");
                    Ok(())
                } else {
                    Err(VersioningError::UnsupportedMutation(format!(
                        "batch_delete on {} is not versioned; enable ignoreMissingHooks to allow it",
                        op.collection
                    )))
                }
            }
        }
    }
}

impl Interceptor for VersioningInterceptor {
    fn process<'a>(
        &'a self,
        mutation: &'a mut Mutation,
        ctx: &'a mut MutationContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = self.prepare(mutation).await {
                if self.config.log_errors {
                    error!(
                        request_id = %ctx.request_id,
                        mutation = mutation.name(),
                        collection = %mutation.collection(),
                        code = e.code(),
                        error = %e,
                        "versioning aborted mutation"
                    );
                }
                return Err(e);
            }
            next.run(mutation, ctx).await
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::{Pipeline, PipelineBuilder, StoreExecutor};
    use crate::store::InMemoryStore;

    pub fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap_or_default()
    }

    pub fn pipeline(store: &Arc<InMemoryStore>, config: VersioningConfig) -> Pipeline {
        let interceptor = VersioningInterceptor::new(store.clone(), config).unwrap();
        PipelineBuilder::new()
            .with(interceptor)
            .build(StoreExecutor::new(store.clone()))
    }
}
