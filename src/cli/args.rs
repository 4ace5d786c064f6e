//! CLI argument definitions using clap
//!
//! Commands:
//! - docversion demo [--config <path>]
//! - docversion apply --collection <name> [--config <path>] [--schema <path>] [--dump]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docversion - transparent document versioning
#[derive(Parser, Debug)]
#[command(name = "docversion")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, update and delete a few pages, then print both collections
    Demo {
        /// Path to a versioning config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply newline-delimited JSON mutations read from stdin
    Apply {
        /// Live collection the mutations target
        #[arg(long)]
        collection: String,

        /// Path to a versioning config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the live collection's schema (JSON)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Print the live and history collections after the last mutation
        #[arg(long)]
        dump: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
