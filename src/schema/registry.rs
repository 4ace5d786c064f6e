//! Schema registry
//!
//! Holds each live collection's declared schema next to the history schema
//! derived from it. The derivation happens once, at registration:
//!
//! - every live field except `_id` is copied with `required` and `unique`
//!   cleared, since history rows are partial snapshots
//! - `_id` becomes the composite identity `{ _id: mixed, _version: int }`
//! - `_version` is added as a required int

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldDef, FieldType, Schema};
use crate::identity::{ID_FIELD, VERSION_FIELD};

#[derive(Debug, Clone)]
struct Registered {
    live: Schema,
    history: Schema,
}

/// Live and history schemas indexed by live collection name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Registered>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live schema and derive its history schema.
    ///
    /// Registration is write-once per collection.
    pub fn register(&mut self, live: Schema, history_collection: &str) -> SchemaResult<&Schema> {
        live.validate_structure()?;

        if self.schemas.contains_key(&live.name) {
            return Err(SchemaError::AlreadyRegistered(live.name.clone()));
        }

        let history = history_schema(&live, history_collection);
        let name = live.name.clone();
        let entry = self
            .schemas
            .entry(name)
            .or_insert(Registered { live, history });
        Ok(&entry.history)
    }

    /// Load a live schema from a JSON file and register it
    pub fn load_file(&mut self, path: &Path, history_collection: &str) -> SchemaResult<&Schema> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::Malformed(format!("failed to read {}: {}", path.display(), e))
        })?;
        let live = Schema::from_json_str(&content)?;
        self.register(live, history_collection)
    }

    /// The declared schema of a live collection
    pub fn live(&self, collection: &str) -> Option<&Schema> {
        self.schemas.get(collection).map(|r| &r.live)
    }

    /// The history schema derived for a live collection
    pub fn history(&self, collection: &str) -> Option<&Schema> {
        self.schemas.get(collection).map(|r| &r.history)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Build the history schema for a live schema
pub fn history_schema(live: &Schema, history_collection: &str) -> Schema {
    let mut fields: HashMap<String, FieldDef> = live
        .fields
        .iter()
        .filter(|(name, _)| name.as_str() != ID_FIELD)
        .map(|(name, def)| (name.clone(), def.relaxed()))
        .collect();

    let mut id_fields = HashMap::new();
    id_fields.insert(ID_FIELD.to_string(), FieldDef::new(FieldType::Mixed, true));
    id_fields.insert(VERSION_FIELD.to_string(), FieldDef::required_int());

    fields.insert(ID_FIELD.to_string(), FieldDef::required_object(id_fields));
    fields.insert(VERSION_FIELD.to_string(), FieldDef::required_int());

    Schema {
        name: history_collection.to_string(),
        description: Some(format!("history of {}", live.name)),
        fields,
    }
}
