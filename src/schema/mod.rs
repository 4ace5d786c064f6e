//! Schema registry for versioned collections
//!
//! Live collections may declare a schema. The history collection's shape is
//! derived from it once, at setup, instead of being reflected at runtime.
//!
//! # Design Principles
//!
//! - `_version` is reserved and may never be declared by a live schema
//! - History schemas relax `required` and `unique` on every copied field
//! - Snapshots of a collection with a schema keep only declared fields

mod errors;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use registry::{history_schema, SchemaRegistry};
pub use types::{FieldDef, FieldType, Schema};
