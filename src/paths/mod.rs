//! Path Filter
//!
//! Decides whether a mutation is worth a history entry, based on which
//! field paths it touches and the configured ignore-list.
//!
//! Paths are dot-separated (`meta.updatedAt`) and compared exactly.

mod diff;
mod filter;
mod update;

pub use diff::changed_paths;
pub use filter::is_versionable;
pub use update::update_paths;

/// A set of dot-separated field paths
pub type PathSet = std::collections::BTreeSet<String>;
