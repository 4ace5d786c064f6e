//! Observability Interceptor
//!
//! Logs every mutation that passes through the pipeline and keeps outcome
//! counters. Placed first, so it also sees mutations the versioning
//! interceptor aborts.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::context::MutationContext;
use crate::core::operation::Mutation;
use crate::core::pipeline::{MutationResult, Next};
use crate::error::VersioningError;

use super::Interceptor;

/// Outcome counters
#[derive(Debug, Default)]
pub struct MutationStats {
    committed: AtomicU64,
    failed: AtomicU64,
    conflicts: AtomicU64,
}

/// Point-in-time copy of `MutationStats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub committed: u64,
    pub failed: u64,
    pub conflicts: u64,
}

impl MutationStats {
    fn record(&self, result: &MutationResult) {
        match result {
            Ok(_) => {
                self.committed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if matches!(e, VersioningError::VersionConflict { .. }) {
                    self.conflicts.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            committed: self.committed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }
}

pub struct ObserveInterceptor {
    stats: Arc<MutationStats>,
}

impl ObserveInterceptor {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(MutationStats::default()),
        }
    }

    /// Shared handle to the counters
    pub fn stats(&self) -> Arc<MutationStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for ObserveInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for ObserveInterceptor {
    fn process<'a>(
        &'a self,
        mutation: &'a mut Mutation,
        ctx: &'a mut MutationContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>> {
        Box::pin(async move {
            let name = mutation.name();
            let collection = mutation.collection().to_string();

            let result = next.run(mutation, ctx).await;

            self.stats.record(&result);
            let elapsed_ms = ctx.elapsed_ms() as u64;
            match &result {
                Ok(_) => info!(
                    request_id = %ctx.request_id,
                    mutation = name,
                    %collection,
                    elapsed_ms,
                    "mutation committed"
                ),
                Err(e) => warn!(
                    request_id = %ctx.request_id,
                    mutation = name,
                    %collection,
                    elapsed_ms,
                    code = e.code(),
                    error = %e,
                    "mutation aborted"
                ),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::StoreExecutor;
    use crate::core::operation::SaveOp;
    use crate::core::pipeline::Pipeline;
    use crate::store::{Document, InMemoryStore};
    use serde_json::json;

    fn create(key: &str) -> Mutation {
        let mut doc = Document::new();
        doc.insert("_id".into(), json!(key));
        Mutation::Create(SaveOp::new("pages", doc))
    }

    #[tokio::test]
    async fn test_counts_outcomes() {
        let observe = ObserveInterceptor::new();
        let stats = observe.stats();
        let pipeline = Pipeline::new(StoreExecutor::new(Arc::new(InMemoryStore::new())))
            .with_interceptor(observe);

        pipeline.execute(create("p1"), MutationContext::new()).await.unwrap();
        // duplicate key
        assert!(pipeline.execute(create("p1"), MutationContext::new()).await.is_err());

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                committed: 1,
                failed: 1,
                conflicts: 0
            }
        );
    }
}
