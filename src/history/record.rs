//! Historical record
//!
//! An immutable snapshot of a live record as it was before a mutation, or a
//! tombstone marking its deletion. Stored as:
//!
//! ```text
//! { "_id": { "_id": key, "_version": v }, "_version": v | -1, ...fields }
//! ```

use serde_json::Value;

use crate::error::{VersioningError, VersioningResult};
use crate::gate::TOMBSTONE_VERSION;
use crate::identity::{CompositeId, ID_FIELD, VERSION_FIELD};
use crate::store::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    id: CompositeId,
    version: i64,
    fields: Document,
}

impl HistoryRecord {
    /// Snapshot of `fields` under `(key, version)`.
    ///
    /// Any `_id` / `_version` in `fields` is dropped; the record's own
    /// identity and version take their place.
    pub fn snapshot(key: Value, version: i64, fields: &Document) -> Self {
        let fields = fields
            .iter()
            .filter(|(k, _)| k.as_str() != ID_FIELD && k.as_str() != VERSION_FIELD)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            id: CompositeId::new(key, version),
            version,
            fields,
        }
    }

    /// Deletion marker under `(key, version)`
    pub fn tombstone(key: Value, version: i64) -> Self {
        Self {
            id: CompositeId::new(key, version),
            version: TOMBSTONE_VERSION,
            fields: Document::new(),
        }
    }

    pub fn id(&self) -> &CompositeId {
        &self.id
    }

    /// The live record's key
    pub fn key(&self) -> &Value {
        self.id.live_key()
    }

    /// `_version` of the record; `-1` for tombstones
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_tombstone(&self) -> bool {
        self.version == TOMBSTONE_VERSION
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Stored form
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), self.id.encode());
        doc.insert(VERSION_FIELD.to_string(), Value::from(self.version));
        for (k, v) in &self.fields {
            doc.insert(k.clone(), v.clone());
        }
        doc
    }

    /// Parse the stored form
    pub fn from_document(mut doc: Document) -> VersioningResult<Self> {
        let id = doc
            .remove(ID_FIELD)
            .ok_or_else(|| VersioningError::InvalidIdentity(format!("missing {}", ID_FIELD)))?;
        let id = CompositeId::decode(&id)?;

        let version = doc
            .remove(VERSION_FIELD)
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                VersioningError::invalid_document(format!(
                    "history record without integer {}",
                    VERSION_FIELD
                ))
            })?;

        Ok(Self {
            id,
            version,
            fields: doc,
        })
    }
}
