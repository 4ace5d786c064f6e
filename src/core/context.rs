//! Mutation Context
//!
//! Carried through the interceptor pipeline alongside the mutation.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

/// Context carried through the interceptor pipeline
#[derive(Debug, Clone)]
pub struct MutationContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Free-form metadata for interceptors and logs
    pub metadata: HashMap<String, Value>,

    started_at: Instant,
}

impl MutationContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            metadata: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for MutationContext {
    fn default() -> Self {
        Self::new()
    }
}
