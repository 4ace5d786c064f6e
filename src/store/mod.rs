//! Document store seam
//!
//! The versioning core only ever reads by key, inserts, and runs filtered
//! scans (`DocumentStore`). Committing the live mutation itself is the
//! host's business and goes through the wider `LiveStore` surface.
//!
//! `InMemoryStore` implements both and backs the tests and the CLI.

mod errors;
mod filter;
mod memory;
mod traits;
mod update;

pub use errors::{StoreError, StoreResult};
pub use filter::{get_path, matches};
pub use memory::InMemoryStore;
pub use traits::{DocumentStore, LiveStore};
pub use update::apply_update;

/// A schema-less document: a JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;
