//! # fydo: Command-Line Product Search
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        fydo CLI Flow                                    │
//! │                                                                         │
//! │  args ──► Cli::parse() ──► FydoConfig::load(--config)                  │
//! │                                   │                                     │
//! │            ┌──────────────────────┼───────────────────────┐             │
//! │            ▼                      ▼                       ▼             │
//! │        search                  lookup                   cache           │
//! │  search_with_page_size()   BarcodeLookup         count / prune          │
//! │            │                      │                       │             │
//! │            └──────────────────────┴───────────────────────┘             │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                        JSON on stdout, logs on stderr                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod args;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use fydo_core::validation::is_barcode_query;
use fydo_core::{IngredientFilter, SearchOptions};
use fydo_db::{Database, DbConfig, DbError};
use fydo_search::{search_with_page_size, BarcodeLookup, FydoConfig, OpenFoodFactsClient, SearchError};

use crate::args::{CacheCommand, Cli, Command, SearchArgs};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Cache error: {0}")]
    Db(#[from] DbError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::Search(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=fydo_search=trace` - Trace the search crate only
/// - Default: `info,fydo=debug,sqlx=warn`
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fydo=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = FydoConfig::load(cli.config.clone())?;
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    match cli.command {
        Command::Search(args) => search(&config, cli.db, args).await,

        Command::Lookup { code } => lookup(&config, cli.db, &code).await,

        Command::Cache(CacheCommand::Count) => {
            let db = open_cache(&config, cli.db).await?;
            let count = db.products().count().await?;
            db.close().await;
            print_json(&serde_json::json!({ "count": count }))
        }

        Command::Cache(CacheCommand::Prune { days }) => {
            let window = match days {
                Some(days) => chrono::Duration::try_days(days)
                    .ok_or_else(|| CliError::Usage(format!("--days out of range: {}", days)))?,
                None => config.cache.freshness_window()?,
            };
            let cutoff = chrono::Utc::now()
                .checked_sub_signed(window)
                .ok_or_else(|| CliError::Usage("prune cutoff is out of range".into()))?;

            let db = open_cache(&config, cli.db).await?;
            let removed = db.products().prune_older_than(cutoff).await?;
            db.close().await;

            info!(removed, days = window.num_days(), "Cache pruned");
            print_json(&serde_json::json!({ "removed": removed, "cutoff": cutoff }))
        }
    }
}

async fn search(config: &FydoConfig, db_path: Option<PathBuf>, args: SearchArgs) -> Result<(), CliError> {
    let query = args.query();
    if args.with.is_empty() && args.without.is_empty() && is_barcode_query(&query) {
        info!(query = %query, "Query looks like a barcode, looking it up");
        return lookup(config, db_path, &query).await;
    }

    let options = SearchOptions {
        start_page: args.page.unwrap_or(1),
        page_size: config.search.page_size,
        min_results: args.min_results.unwrap_or(config.search.min_results),
        max_pages: args.max_pages.unwrap_or(config.search.max_pages),
    };
    let filter = IngredientFilter::new(args.with, args.without);
    let client = OpenFoodFactsClient::new(&config.api)?;

    let outcome = search_with_page_size(
        &client,
        &query,
        &filter,
        options,
        config.search.filtered_page_size,
    )
    .await?;
    print_json(&outcome)
}

async fn lookup(config: &FydoConfig, db_path: Option<PathBuf>, code: &str) -> Result<(), CliError> {
    let db = open_cache(config, db_path).await?;
    let client = OpenFoodFactsClient::new(&config.api)?;

    let lookup = BarcodeLookup::new(client, db.products())
        .with_freshness(config.cache.freshness_window()?);
    let outcome = lookup.lookup(code).await?;

    db.close().await;
    print_json(&outcome)
}

/// Opens the cache at `--db`, the configured path, or the platform default.
async fn open_cache(config: &FydoConfig, db_path: Option<PathBuf>) -> Result<Database, CliError> {
    let path = db_path
        .or_else(|| config.cache.resolved_database_path())
        .ok_or_else(|| CliError::Usage("no cache path; pass --db <PATH>".into()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(Database::new(DbConfig::new(path)).await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
