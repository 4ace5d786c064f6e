//! # Schema Errors

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A live schema declares a field the versioning layer owns
    #[error("Schema '{schema}' can't declare reserved field '{field}'")]
    ReservedField { schema: String, field: String },

    #[error("Invalid schema structure: {0}")]
    InvalidStructure(String),

    #[error("Malformed schema: {0}")]
    Malformed(String),

    #[error("Schema already registered for collection '{0}'")]
    AlreadyRegistered(String),
}

impl SchemaError {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::ReservedField { .. } => "RESERVED_FIELD",
            SchemaError::InvalidStructure(_) => "INVALID_SCHEMA",
            SchemaError::Malformed(_) => "MALFORMED_SCHEMA",
            SchemaError::AlreadyRegistered(_) => "SCHEMA_ALREADY_REGISTERED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_field_message() {
        let err = SchemaError::ReservedField {
            schema: "pages".into(),
            field: "_version".into(),
        };
        assert!(err.to_string().contains("_version"));
        assert_eq!(err.code(), "RESERVED_FIELD");
    }
}
