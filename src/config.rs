//! Versioning Configuration
//!
//! Options recognised by the versioning layer. Passed by reference into
//! every interceptor; there is no process-wide state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VersioningError, VersioningResult};
use crate::identity::{ID_FIELD, VERSION_FIELD};
use crate::paths::PathSet;

/// Versioning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersioningConfig {
    /// Collection historical records are written to (default: "versions")
    #[serde(default = "default_history_collection")]
    pub history_collection_name: String,

    /// Field paths whose modification alone never produces history
    #[serde(default)]
    pub ignore_paths: PathSet,

    /// Log aborted mutations at ERROR level
    #[serde(default)]
    pub log_errors: bool,

    /// Forward mutation kinds without versioning support instead of
    /// rejecting them
    #[serde(default)]
    pub ignore_missing_hooks: bool,
}

fn default_history_collection() -> String {
    "versions".to_string()
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            history_collection_name: default_history_collection(),
            ignore_paths: PathSet::new(),
            log_errors: false,
            ignore_missing_hooks: false,
        }
    }
}

impl From<&str> for VersioningConfig {
    /// A bare string names the history collection
    fn from(collection: &str) -> Self {
        Self::with_collection(collection)
    }
}

impl VersioningConfig {
    /// Create a config writing history to the given collection
    pub fn with_collection(collection: impl Into<String>) -> Self {
        Self {
            history_collection_name: collection.into(),
            ..Default::default()
        }
    }

    pub fn with_ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }

    pub fn with_ignore_missing_hooks(mut self, enabled: bool) -> Self {
        self.ignore_missing_hooks = enabled;
        self
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> VersioningResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VersioningError::config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_file(path: &Path) -> VersioningResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VersioningError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> VersioningResult<()> {
        if self.history_collection_name.trim().is_empty() {
            return Err(VersioningError::config(
                "historyCollectionName must not be empty",
            ));
        }
        for reserved in [ID_FIELD, VERSION_FIELD] {
            if self.ignore_paths.contains(reserved) {
                return Err(VersioningError::config(format!(
                    "ignorePaths may not contain reserved field {}",
                    reserved
                )));
            }
        }
        Ok(())
    }
}
