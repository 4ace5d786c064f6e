//! Schema type definitions
//!
//! Supported types:
//! - string, int, float, bool, date (ISO 8601 string)
//! - mixed: any JSON value
//! - object: nested field schema
//! - array: homogeneous array with element type

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use crate::identity::VERSION_FIELD;
use crate::store::Document;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    /// ISO 8601 timestamp stored as a string
    Date,
    /// Any JSON value
    Mixed,
    /// Nested object with its own field schema
    Object {
        fields: HashMap<String, FieldDef>,
    },
    /// Homogeneous array with single element type
    Array {
        #[serde(rename = "element_type")]
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Mixed => "mixed",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    #[serde(default)]
    pub required: bool,
    /// Whether values must be unique across the collection
    #[serde(default)]
    pub unique: bool,
}

impl FieldDef {
    pub fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
            unique: false,
        }
    }

    pub fn required_string() -> Self {
        Self::new(FieldType::String, true)
    }

    pub fn optional_string() -> Self {
        Self::new(FieldType::String, false)
    }

    pub fn required_int() -> Self {
        Self::new(FieldType::Int, true)
    }

    pub fn optional_int() -> Self {
        Self::new(FieldType::Int, false)
    }

    pub fn optional_date() -> Self {
        Self::new(FieldType::Date, false)
    }

    pub fn mixed() -> Self {
        Self::new(FieldType::Mixed, false)
    }

    pub fn required_object(fields: HashMap<String, FieldDef>) -> Self {
        Self::new(FieldType::Object { fields }, true)
    }

    pub fn optional_array(element_type: FieldType) -> Self {
        Self::new(
            FieldType::Array {
                element_type: Box::new(element_type),
            },
            false,
        )
    }

    /// Mark the field unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Copy suitable for a history schema: nothing required, nothing unique
    pub fn relaxed(&self) -> Self {
        Self {
            field_type: self.field_type.clone(),
            required: false,
            unique: false,
        }
    }
}

/// A collection's declared shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Collection the schema describes
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: HashMap<String, FieldDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: HashMap<String, FieldDef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Parse a schema from its JSON form
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    /// Add a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> SchemaResult<()> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidStructure(
                "schema name must not be empty".into(),
            ));
        }
        if self.fields.contains_key(VERSION_FIELD) {
            return Err(SchemaError::ReservedField {
                schema: self.name.clone(),
                field: VERSION_FIELD.to_string(),
            });
        }
        for name in self.fields.keys() {
            if name.is_empty() || name.starts_with('$') || name.contains('.') {
                return Err(SchemaError::InvalidStructure(format!(
                    "invalid field name '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Keep only the top-level fields this schema declares
    pub fn project(&self, doc: &Document) -> Document {
        doc.iter()
            .filter(|(k, _)| self.fields.contains_key(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
