//! Delete interception
//!
//! Deletes are always versioned. The content snapshot is taken from the
//! caller's image of the record, at its current version; the tombstone
//! takes the next version so the two never collide.

use super::VersioningInterceptor;
use crate::core::DeleteOp;
use crate::error::VersioningResult;
use crate::identity::{document_version, require_key};

pub(super) async fn prepare(
    interceptor: &VersioningInterceptor,
    op: &mut DeleteOp,
) -> VersioningResult<()> {
    let key = require_key(&op.document)?;
    let current = document_version(&op.document).unwrap_or(0);

    interceptor
        .snapshot(&op.collection, &key, current, &op.document)
        .await?;
    interceptor.history.tombstone(&key, current + 1).await?;
    Ok(())
}
