//! CLI command implementations
//!
//! Both commands run against a fresh in-memory store. The async work runs
//! on a current-thread tokio runtime owned by the command.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::collection::VersionedCollection;
use crate::config::VersioningConfig;
use crate::core::Mutation;
use crate::error::VersioningError;
use crate::schema::Schema;
use crate::store::{Document, InMemoryStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Demo { config } => demo(config.as_deref()),
        Command::Apply {
            collection,
            config,
            schema,
            dump,
        } => apply(&collection, config.as_deref(), schema.as_deref(), dump),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<VersioningConfig> {
    match path {
        Some(path) => Ok(VersioningConfig::from_file(path)?),
        None => Ok(VersioningConfig::default()),
    }
}

fn load_schema(path: &Path) -> CliResult<Schema> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::config_error(format!("failed to read {}: {}", path.display(), e)))?;
    Ok(Schema::from_json_str(&content)?)
}

fn runtime() -> CliResult<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("failed to create tokio runtime: {}", e)))
}

/// Run the page scenario and print the resulting collections
pub fn demo(config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    let report = runtime()?.block_on(demo_scenario(config))?;
    write_response(&mut io::stdout(), report)
}

async fn demo_scenario(config: VersioningConfig) -> CliResult<Value> {
    let store = Arc::new(InMemoryStore::new());
    let pages = VersionedCollection::new("pages", store.clone(), config)?;

    let mut foo = pages
        .create(fields(json!({"title": "foo", "path": "/foo", "content": "first"})))
        .await?;
    let bar = pages
        .create(fields(json!({"title": "bar", "path": "/bar", "content": "second"})))
        .await?;

    foo.set("title", json!("foo 2"));
    pages.save(&mut foo).await?;
    foo.set("content", json!("first, edited"));
    pages.save(&mut foo).await?;

    pages.delete(bar).await?;
    info!(stats = ?pages.stats(), "demo finished");

    Ok(json!({
        "live": collection_dump(&store, pages.name())?,
        "history": collection_dump(&store, pages.history_collection())?,
        "stats": pages.stats(),
    }))
}

/// Stream mutations from stdin and answer each on stdout
pub fn apply(
    collection: &str,
    config: Option<&Path>,
    schema: Option<&Path>,
    dump: bool,
) -> CliResult<()> {
    let config = load_config(config)?;
    let store = Arc::new(InMemoryStore::new());

    let versioned = match schema {
        Some(path) => {
            let schema = load_schema(path)?;
            if schema.name != collection {
                return Err(CliError::config_error(format!(
                    "schema {} does not describe collection {}",
                    schema.name, collection
                )));
            }
            VersionedCollection::with_schema(store, config, schema)?
        }
        None => VersionedCollection::new(collection, store, config)?,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    runtime()?.block_on(apply_stream(&versioned, stdin.lock(), &mut stdout, dump))
}

/// Apply every mutation in `input`, writing one response line per mutation.
///
/// A failed mutation is reported and processing continues; only I/O errors
/// on `output` stop the stream.
pub async fn apply_stream<R: BufRead, W: Write>(
    versioned: &VersionedCollection<InMemoryStore>,
    input: R,
    output: &mut W,
    dump: bool,
) -> CliResult<()> {
    for request in read_requests(input) {
        let mutation = match request.and_then(|v| Ok(serde_json::from_value::<Mutation>(v)?)) {
            Ok(mutation) => mutation,
            Err(e) => {
                write_error(output, e.code(), &e.to_string())?;
                continue;
            }
        };

        match versioned.execute(mutation).await {
            Ok(outcome) => write_response(output, serde_json::to_value(outcome)?)?,
            Err(e) => write_error(output, e.code(), &e.to_string())?,
        }
    }

    if dump {
        let store = versioned.store();
        write_response(
            output,
            json!({
                "live": collection_dump(store, versioned.name())?,
                "history": collection_dump(store, versioned.history_collection())?,
                "stats": versioned.stats(),
            }),
        )?;
    }
    Ok(())
}

fn collection_dump(store: &InMemoryStore, collection: &str) -> CliResult<Value> {
    let docs = store
        .documents(collection)
        .map_err(VersioningError::from)?;
    Ok(Value::Array(docs.into_iter().map(Value::Object).collect()))
}

fn fields(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
