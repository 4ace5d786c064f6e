//! Version Gate
//!
//! Optimistic concurrency check for single-document saves. A save may only
//! proceed if the version the caller last observed is still the persisted
//! version; the record then advances by exactly one.
//!
//! No locks are held between the check and the live write. The live commit
//! re-checks with a conditional replace, which narrows the window to the
//! store's own atomicity.

use serde_json::Value;
use tracing::debug;

use crate::error::{VersioningError, VersioningResult};

/// Version assigned to a record on its first committed create
pub const INITIAL_VERSION: i64 = 1;

/// Version carried by tombstone history records
pub const TOMBSTONE_VERSION: i64 = -1;

/// Admit a brand-new record. No conflict check is possible or needed.
#[inline]
pub fn admit_new() -> i64 {
    INITIAL_VERSION
}

/// Compare the persisted version with the version the caller observed and
/// return the version the record will carry after this mutation.
///
/// # Errors
///
/// - `NotFound` if there is no persisted record any more
/// - `VersionConflict` if another writer committed since the caller read
pub fn check_and_advance(
    collection: &str,
    key: &Value,
    persisted: Option<i64>,
    observed: Option<i64>,
) -> VersioningResult<i64> {
    let persisted = persisted.ok_or_else(|| VersioningError::not_found(collection, key))?;

    if observed != Some(persisted) {
        debug!(%key, ?observed, persisted, "version gate rejected save");
        return Err(VersioningError::VersionConflict {
            key: key.to_string(),
            observed,
            persisted,
        });
    }

    Ok(persisted + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_records_start_at_one() {
        assert_eq!(admit_new(), 1);
    }

    #[test]
    fn test_matching_versions_advance_by_one() {
        assert_eq!(check_and_advance("pages", &json!("p"), Some(1), Some(1)).unwrap(), 2);
        assert_eq!(check_and_advance("pages", &json!("p"), Some(41), Some(41)).unwrap(), 42);
    }

    #[test]
    fn test_missing_persisted_record() {
        let err = check_and_advance("pages", &json!("p"), None, Some(1)).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_stale_observed_version() {
        let err = check_and_advance("pages", &json!("p"), Some(3), Some(2)).unwrap_err();
        assert_eq!(
            err,
            VersioningError::VersionConflict {
                key: "\"p\"".into(),
                observed: Some(2),
                persisted: 3,
            }
        );
    }

    #[test]
    fn test_unversioned_in_memory_record_conflicts() {
        let err = check_and_advance("pages", &json!("p"), Some(1), None).unwrap_err();
        assert_eq!(err.code(), "VERSION_CONFLICT");
    }
}
