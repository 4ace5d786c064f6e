//! # Mutation Pipeline
//!
//! Every write against a live collection is a `Mutation` value that travels
//! through a chain of interceptors before a `MutationExecutor` commits it.
//!
//! ## Design Principles
//!
//! - Single tagged mutation model for all entry points
//! - Interceptors may rewrite or abort, never commit
//! - The executor is the only stage that touches the live store

pub mod context;
pub mod executor;
pub mod interceptor;
pub mod operation;
pub mod pipeline;

pub use context::MutationContext;
pub use executor::StoreExecutor;
pub use interceptor::observe::{MutationStats, ObserveInterceptor, StatsSnapshot};
pub use interceptor::Interceptor;
pub use operation::{BatchDeleteOp, BatchUpdateOp, DeleteOp, Mutation, MutationOutcome, SaveOp};
pub use pipeline::{MutationExecutor, MutationResult, Next, Pipeline, PipelineBuilder};
