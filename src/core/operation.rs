//! Mutation Model
//!
//! Every write against a live collection routes through this enum, so the
//! versioning interceptor sees one tagged value instead of per-kind hooks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::paths::PathSet;
use crate::store::Document;

/// A mutation of a live collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a new record
    Create(SaveOp),
    /// Replace an existing record
    Update(SaveOp),
    /// Remove a single record
    Delete(DeleteOp),
    /// Apply an update document to every matching record
    BatchUpdate(BatchUpdateOp),
    /// Remove every matching record (no versioning support)
    BatchDelete(BatchDeleteOp),
}

impl Mutation {
    /// The live collection this mutation targets
    pub fn collection(&self) -> &str {
        match self {
            Self::Create(op) | Self::Update(op) => &op.collection,
            Self::Delete(op) => &op.collection,
            Self::BatchUpdate(op) => &op.collection,
            Self::BatchDelete(op) => &op.collection,
        }
    }

    /// Mutation name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::BatchUpdate(_) => "batch_update",
            Self::BatchDelete(_) => "batch_delete",
        }
    }
}

/// Create or update a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOp {
    pub collection: String,
    /// Full working image; `_version` is the version the caller observed
    pub document: Document,
    /// Paths the caller modified. `None` means unknown, which always
    /// versions.
    #[serde(default)]
    pub changed_paths: Option<PathSet>,
    /// Version the live commit must still find persisted; set by the
    /// versioning interceptor, never by callers
    #[serde(skip)]
    pub expected_version: Option<i64>,
}

impl SaveOp {
    pub fn new(collection: impl Into<String>, document: Document) -> Self {
        Self {
            collection: collection.into(),
            document,
            changed_paths: None,
            expected_version: None,
        }
    }

    pub fn with_changed_paths(mut self, paths: PathSet) -> Self {
        self.changed_paths = Some(paths);
        self
    }
}

/// Delete a single record given its in-memory image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub collection: String,
    pub document: Document,
}

/// Conditional multi-record update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateOp {
    pub collection: String,
    #[serde(default)]
    pub filter: Document,
    pub update: Document,
}

/// Conditional multi-record delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDeleteOp {
    pub collection: String,
    #[serde(default)]
    pub filter: Document,
}

/// What a committed mutation did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created { key: Value, version: Option<i64> },
    Updated { key: Value, version: Option<i64> },
    Deleted { key: Value, existed: bool },
    BatchUpdated { matched: u64 },
    BatchDeleted { removed: u64 },
}
