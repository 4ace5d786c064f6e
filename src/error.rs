//! Versioning Error Types
//!
//! Every error aborts the mutation that raised it. Nothing here is retried.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for versioning operations
pub type VersioningResult<T> = Result<T, VersioningError>;

/// Versioning errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VersioningError {
    /// The update target vanished between read and write
    #[error("Document not found in {collection}: {key}")]
    NotFound { collection: String, key: String },

    /// Optimistic check failed: someone else committed first
    #[error("Version conflict on {key}: observed {observed:?}, persisted {persisted}")]
    VersionConflict {
        key: String,
        observed: Option<i64>,
        persisted: i64,
    },

    /// Composite identity already present in the history store
    #[error("Duplicate history entry for {key} at version {version}")]
    DuplicateHistory { key: String, version: i64 },

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported mutation: {0}")]
    UnsupportedMutation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl VersioningError {
    /// Create a not found error
    pub fn not_found(collection: impl Into<String>, key: &serde_json::Value) -> Self {
        Self::NotFound {
            collection: collection.into(),
            key: key.to_string(),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable error code for responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::DuplicateHistory { .. } => "DUPLICATE_HISTORY",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
            Self::InvalidIdentity(_) => "INVALID_IDENTITY",
            Self::InvalidDocument(_) => "INVALID_DOCUMENT",
            Self::UnsupportedMutation(_) => "UNSUPPORTED_MUTATION",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Schema(e) => e.code(),
        }
    }

    /// True for the errors that indicate a broken invariant rather than a
    /// rejected request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateHistory { .. })
    }
}

impl From<StoreError> for VersioningError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, key } => Self::NotFound { collection, key },
            StoreError::VersionMismatch {
                key,
                expected,
                found,
            } => Self::VersionConflict {
                key,
                observed: Some(expected),
                persisted: found,
            },
            other => Self::StorageFailure(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for VersioningError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidDocument(e.to_string())
    }
}
