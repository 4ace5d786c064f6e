//! Identity Codec
//!
//! A historical record is identified by the live record's primary key
//! together with the version the live record held when the snapshot was
//! taken. The composite identity is stored as a nested object:
//!
//! ```text
//! { "_id": <live key>, "_version": <version> }
//! ```
//!
//! Both directions are pure functions with no I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{VersioningError, VersioningResult};
use crate::store::Document;

/// Primary key field of live and historical records
pub const ID_FIELD: &str = "_id";

/// Reserved version counter field
pub const VERSION_FIELD: &str = "_version";

/// The (live key, version) pair identifying a historical snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeId {
    #[serde(rename = "_id")]
    key: Value,
    #[serde(rename = "_version")]
    version: i64,
}

impl CompositeId {
    /// Creates a composite identity. Total: any key and version are accepted.
    pub fn new(key: Value, version: i64) -> Self {
        Self { key, version }
    }

    /// Projects back to the live record's primary key.
    pub fn live_key(&self) -> &Value {
        &self.key
    }

    /// The version component.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Encodes into the stored `{ _id, _version }` shape.
    pub fn encode(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(ID_FIELD.to_string(), self.key.clone());
        obj.insert(VERSION_FIELD.to_string(), Value::from(self.version));
        Value::Object(obj)
    }

    /// Decodes a stored composite identity.
    ///
    /// # Errors
    ///
    /// `InvalidIdentity` unless the value is an object holding exactly a
    /// non-null `_id` and an integer `_version`.
    pub fn decode(value: &Value) -> VersioningResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            VersioningError::InvalidIdentity(format!("expected object, got {}", value))
        })?;

        if obj.len() != 2 {
            return Err(VersioningError::InvalidIdentity(format!(
                "expected exactly {{{}, {}}}, got {} fields",
                ID_FIELD,
                VERSION_FIELD,
                obj.len()
            )));
        }

        let key = match obj.get(ID_FIELD) {
            Some(Value::Null) | None => {
                return Err(VersioningError::InvalidIdentity(format!(
                    "missing {}",
                    ID_FIELD
                )))
            }
            Some(k) => k.clone(),
        };

        let version = obj
            .get(VERSION_FIELD)
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                VersioningError::InvalidIdentity(format!("{} must be an integer", VERSION_FIELD))
            })?;

        Ok(Self { key, version })
    }
}

/// Encodes `(key, version)` into a composite identity value.
pub fn encode(key: &Value, version: i64) -> Value {
    CompositeId::new(key.clone(), version).encode()
}

/// Decodes a composite identity value into `(key, version)`.
pub fn decode(id: &Value) -> VersioningResult<(Value, i64)> {
    let id = CompositeId::decode(id)?;
    Ok((id.key, id.version))
}

/// Primary key of a document, if it has one.
pub fn document_key(doc: &Document) -> Option<&Value> {
    doc.get(ID_FIELD).filter(|v| !v.is_null())
}

/// Version counter of a document, if it has one.
pub fn document_version(doc: &Document) -> Option<i64> {
    doc.get(VERSION_FIELD).and_then(Value::as_i64)
}

/// Primary key of a document, or `InvalidDocument` when absent.
pub fn require_key(doc: &Document) -> VersioningResult<Value> {
    document_key(doc)
        .cloned()
        .ok_or_else(|| VersioningError::invalid_document(format!("document has no {}", ID_FIELD)))
}
