//! Store Executor
//!
//! Final pipeline stage: commits a mutation to the live store.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::trace;

use crate::core::context::MutationContext;
use crate::core::operation::{BatchDeleteOp, BatchUpdateOp, DeleteOp, Mutation, MutationOutcome, SaveOp};
use crate::core::pipeline::{MutationExecutor, MutationResult};
use crate::identity::{document_version, require_key};
use crate::store::LiveStore;

/// Executor that commits mutations through a `LiveStore`
pub struct StoreExecutor {
    store: Arc<dyn LiveStore>,
}

impl StoreExecutor {
    pub fn new(store: Arc<dyn LiveStore>) -> Self {
        Self { store }
    }
}

impl MutationExecutor for StoreExecutor {
    fn execute<'a>(
        &'a self,
        mutation: &'a Mutation,
        ctx: &'a MutationContext,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>> {
        Box::pin(async move {
            trace!(request_id = %ctx.request_id, mutation = mutation.name(), "committing");
            match mutation {
                Mutation::Create(op) => self.create(op).await,
                Mutation::Update(op) => self.update(op).await,
                Mutation::Delete(op) => self.delete(op).await,
                Mutation::BatchUpdate(op) => self.batch_update(op).await,
                Mutation::BatchDelete(op) => self.batch_delete(op).await,
            }
        })
    }
}

impl StoreExecutor {
    async fn create(&self, op: &SaveOp) -> MutationResult {
        let key = self
            .store
            .insert(&op.collection, op.document.clone())
            .await?;
        Ok(MutationOutcome::Created {
            key,
            version: document_version(&op.document),
        })
    }

    async fn update(&self, op: &SaveOp) -> MutationResult {
        let key = require_key(&op.document)?;
        self.store
            .replace(&op.collection, op.document.clone(), op.expected_version)
            .await?;
        Ok(MutationOutcome::Updated {
            key,
            version: document_version(&op.document),
        })
    }

    async fn delete(&self, op: &DeleteOp) -> MutationResult {
        let key = require_key(&op.document)?;
        let existed = self.store.remove(&op.collection, &key).await?;
        Ok(MutationOutcome::Deleted { key, existed })
    }

    async fn batch_update(&self, op: &BatchUpdateOp) -> MutationResult {
        let matched = self
            .store
            .update_many(&op.collection, &op.filter, &op.update)
            .await?;
        Ok(MutationOutcome::BatchUpdated { matched })
    }

    async fn batch_delete(&self, op: &BatchDeleteOp) -> MutationResult {
        let removed = self.store.remove_many(&op.collection, &op.filter).await?;
        Ok(MutationOutcome::BatchDeleted { removed })
    }
}
