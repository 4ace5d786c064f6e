//! docversion - transparent document versioning
//!
//! Every mutation of a live record preserves the record's prior state in a
//! companion history collection, keyed by `(live key, version)`, under an
//! optimistic-concurrency check on the reserved `_version` field.
//!
//! The pieces, bottom-up:
//!
//! - [`identity`]: composite history identities
//! - [`gate`]: version checks for single-document saves
//! - [`paths`]: changed-path computation and the ignore-list filter
//! - [`history`]: append-only history writes and lookups
//! - [`versioning`]: the interceptor applying all of the above
//! - [`collection`]: a per-collection facade over the pipeline

pub mod cli;
pub mod collection;
pub mod config;
pub mod core;
pub mod error;
pub mod gate;
pub mod history;
pub mod identity;
pub mod paths;
pub mod schema;
pub mod store;
pub mod versioning;

pub use collection::{TrackedDocument, VersionedCollection};
pub use config::VersioningConfig;
pub use error::{VersioningError, VersioningResult};
pub use history::{HistoryRecord, HistoryWriter};
pub use identity::CompositeId;
pub use versioning::VersioningInterceptor;
