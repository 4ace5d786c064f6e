//! History store access
//!
//! Append-only: historical records are inserted once and never mutated.

mod record;
mod writer;

pub use record::HistoryRecord;
pub use writer::HistoryWriter;
