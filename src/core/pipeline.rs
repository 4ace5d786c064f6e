//! Interceptor Pipeline
//!
//! Interceptors run in registration order, each deciding whether to call
//! `next`. The executor at the end commits the (possibly rewritten)
//! mutation to the live store.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::MutationContext;
use super::interceptor::Interceptor;
use super::operation::{Mutation, MutationOutcome};
use crate::error::VersioningResult;

/// Result of a mutation
pub type MutationResult = VersioningResult<MutationOutcome>;

/// Next interceptor in chain
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    executor: &'a dyn MutationExecutor,
}

impl<'a> Next<'a> {
    /// Run the next interceptor or the executor
    pub fn run(
        self,
        mutation: &'a mut Mutation,
        ctx: &'a mut MutationContext,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>> {
        Box::pin(async move {
            if let Some((first, rest)) = self.interceptors.split_first() {
                let next = Next {
                    interceptors: rest,
                    executor: self.executor,
                };
                first.process(mutation, ctx, next).await
            } else {
                self.executor.execute(mutation, ctx).await
            }
        })
    }
}

/// Commits a mutation (final stage of the pipeline)
pub trait MutationExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        mutation: &'a Mutation,
        ctx: &'a MutationContext,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>>;
}

/// The interceptor pipeline
pub struct Pipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
    executor: Arc<dyn MutationExecutor>,
}

impl Pipeline {
    pub fn new(executor: impl MutationExecutor + 'static) -> Self {
        Self {
            interceptors: Vec::new(),
            executor: Arc::new(executor),
        }
    }

    /// Append an interceptor; earlier ones wrap later ones
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Run a mutation through every interceptor and commit it
    pub async fn execute(&self, mut mutation: Mutation, mut ctx: MutationContext) -> MutationResult {
        let next = Next {
            interceptors: &self.interceptors,
            executor: self.executor.as_ref(),
        };
        next.run(&mut mutation, &mut ctx).await
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }
}

/// Builder for pipeline construction
pub struct PipelineBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Add an interceptor already shared elsewhere
    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self, executor: impl MutationExecutor + 'static) -> Pipeline {
        Pipeline {
            interceptors: self.interceptors,
            executor: Arc::new(executor),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
