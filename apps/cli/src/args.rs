//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use fydo_core::{MAX_FRESHNESS_DAYS, MAX_PAGES_CEILING};

/// Food product search over OpenFoodFacts.
#[derive(Debug, Parser)]
#[command(name = "fydo", author, version)]
#[command(about = "Food product search over OpenFoodFacts")]
#[command(arg_required_else_help = true)]
#[command(after_help = "A search query that looks like a barcode (8-14 digits) is looked up by code.\n\
Results are printed as JSON on stdout; logs go to stderr (RUST_LOG).")]
pub struct Cli {
    /// Config file (default: platform config dir/fydo.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache database file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Search products by name, optionally filtered by ingredients
    Search(SearchArgs),

    /// Look a product up by barcode, cache first
    Lookup {
        /// EAN-8, UPC-A, EAN-13 or GTIN-14 code
        code: String,
    },

    /// Inspect or trim the local product cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct SearchArgs {
    /// Product name; several words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Keep only products containing this ingredient (repeatable)
    #[arg(short, long, value_name = "TERM")]
    pub with: Vec<String>,

    /// Drop products containing this ingredient (repeatable)
    #[arg(short = 'x', long, value_name = "TERM")]
    pub without: Vec<String>,

    /// First upstream page to request
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: Option<u32>,

    /// Stop paging once this many matches are collected
    #[arg(long = "min", value_name = "N")]
    pub min_results: Option<u32>,

    /// Most upstream pages to request
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGES_CEILING)))]
    pub max_pages: Option<u32>,
}

impl SearchArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum CacheCommand {
    /// Print the number of cached products
    Count,

    /// Remove cached products older than the freshness window
    Prune {
        /// Age cutoff in days (default: cache.freshness_days)
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_FRESHNESS_DAYS))]
        days: Option<i64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("fydo").chain(line.split_whitespace()))
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_with_filters() {
        let cli = parse("search pate a tartiner --with noisette --without palme --min 10").unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query(), "pate a tartiner");
        assert_eq!(args.with, vec!["noisette".to_string()]);
        assert_eq!(args.without, vec!["palme".to_string()]);
        assert_eq!(args.min_results, Some(10));
        assert_eq!(args.page, None);
        assert_eq!(args.max_pages, None);
    }

    #[test]
    fn test_global_options_anywhere() {
        let cli = parse("--db /tmp/f.db lookup 3017620422003 --config /tmp/f.toml").unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/f.db")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/f.toml")));
        assert_eq!(
            cli.command,
            Command::Lookup {
                code: "3017620422003".into()
            }
        );
    }

    #[test]
    fn test_cache_commands() {
        assert_eq!(
            parse("cache count").unwrap().command,
            Command::Cache(CacheCommand::Count)
        );
        assert_eq!(
            parse("cache prune --days 90").unwrap().command,
            Command::Cache(CacheCommand::Prune { days: Some(90) })
        );
        assert!(parse("cache").is_err());
    }

    #[test]
    fn test_prune_days_are_bounded() {
        assert!(parse("cache prune --days -1").is_err());
        assert!(parse("cache prune --days 9223372036854775807").is_err());
        assert_eq!(
            parse(&format!("cache prune --days {}", MAX_FRESHNESS_DAYS))
                .unwrap()
                .command,
            Command::Cache(CacheCommand::Prune {
                days: Some(MAX_FRESHNESS_DAYS)
            })
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse("search").is_err());
        assert!(parse("lookup").is_err());
        assert!(parse("search nutella --min lots").is_err());
        assert!(parse("search nutella --with").is_err());
        assert!(parse("search nutella --page 0").is_err());
        assert!(parse("search nutella --max-pages 51").is_err());
        assert!(parse("frobnicate").is_err());
        assert!(parse("search nutella --colour red").is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
        assert_eq!(parse("search nutella -h").unwrap_err().kind(), ErrorKind::DisplayHelp);
    }
}
