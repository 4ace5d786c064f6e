//! Interceptor Trait
//!
//! Stages of the mutation pipeline. An interceptor may inspect or rewrite
//! the mutation, then either call `next` or abort with an error.

use std::future::Future;
use std::pin::Pin;

use super::context::MutationContext;
use super::operation::Mutation;
use super::pipeline::{MutationResult, Next};

pub trait Interceptor: Send + Sync {
    fn process<'a>(
        &'a self,
        mutation: &'a mut Mutation,
        ctx: &'a mut MutationContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = MutationResult> + Send + 'a>>;
}

pub mod observe;
