//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::error::VersioningError;
use crate::schema::SchemaError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Versioning(#[from] VersioningError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CLI_IO_ERROR",
            Self::Json(_) => "CLI_INVALID_JSON",
            Self::Config(_) => "CLI_CONFIG_ERROR",
            Self::Runtime(_) => "CLI_RUNTIME_ERROR",
            Self::Schema(e) => e.code(),
            Self::Versioning(e) => e.code(),
        }
    }
}
