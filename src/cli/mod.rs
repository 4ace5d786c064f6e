//! CLI module for docversion
//!
//! Provides command-line interface for:
//! - demo: Run the page versioning scenario on an in-memory store
//! - apply: Stream JSON mutations from stdin through the versioning pipeline

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, apply_stream, demo, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{read_requests, write_error, write_response};
