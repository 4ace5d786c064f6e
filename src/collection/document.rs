//! Tracked documents
//!
//! A working copy of a live record together with the image it was loaded
//! from, so a save knows which paths changed.

use serde_json::Value;

use crate::identity::{document_key, document_version};
use crate::paths::{changed_paths, PathSet};
use crate::store::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDocument {
    data: Document,
    /// Last persisted image; empty for new documents
    original: Document,
    is_new: bool,
}

impl TrackedDocument {
    /// A document that has never been saved
    pub fn new(fields: Document) -> Self {
        Self {
            data: fields,
            original: Document::new(),
            is_new: true,
        }
    }

    /// A document as read from the live store
    pub fn from_persisted(doc: Document) -> Self {
        Self {
            original: doc.clone(),
            data: doc,
            is_new: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn key(&self) -> Option<&Value> {
        document_key(&self.data)
    }

    /// The version this copy was loaded or last saved at
    pub fn version(&self) -> Option<i64> {
        document_version(&self.data)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.data.insert(field.into(), value);
        self
    }

    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    pub fn data(&self) -> &Document {
        &self.data
    }

    pub fn into_document(self) -> Document {
        self.data
    }

    /// Paths changed since the last load or save
    pub fn modified_paths(&self) -> PathSet {
        changed_paths(&self.original, &self.data)
    }

    pub fn is_modified(&self) -> bool {
        !self.modified_paths().is_empty()
    }

    /// Adopt `committed` as the persisted image
    pub(crate) fn mark_persisted(&mut self, committed: Document) {
        self.original = committed.clone();
        self.data = committed;
        self.is_new = false;
    }
}
