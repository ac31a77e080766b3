//! Shelf-Watch main entry point
//!
//! This is the command-line interface for the Shelf-Watch catalog watcher.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use shelf_watch::config::load_config_with_hash;
use shelf_watch::output::{compose_digest, load_statistics, print_statistics, write_digest};
use shelf_watch::{Author, Config, Harvester};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shelf-Watch: watches a bookstore catalog for new titles
///
/// Shelf-Watch tracks a list of authors, stores every newly listed title
/// in a local SQLite database, and reports what was published this week
/// and this month.
#[derive(Parser, Debug)]
#[command(name = "shelf-watch")]
#[command(version = "1.0.0")]
#[command(about = "Watches a bookstore catalog for new titles", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "shelf-watch.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register an author to track
    Add {
        /// Catalog identifier of the author (e.g. 1949874)
        #[arg(long)]
        author_id: String,

        /// Catalog slug of the author (e.g. stephen-king)
        #[arg(long)]
        author_slug: String,
    },

    /// Fetch new books for every tracked author
    Refresh,

    /// Write the weekly/monthly digest
    Report,

    /// Refresh, then write the digest (default)
    Run,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    let mut harvester = Harvester::new(config.clone(), config_hash)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Add {
            author_id,
            author_slug,
        } => {
            harvester.add_author(&Author::new(author_id, author_slug))?;
        }
        Command::Refresh => {
            harvester.refresh().await?;
        }
        Command::Report => {
            handle_report(&config, &harvester)?;
        }
        Command::Run => {
            harvester.refresh().await?;
            handle_report(&config, &harvester)?;
        }
        Command::Stats => {
            handle_stats(&config, &harvester)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_watch=info,warn"),
            1 => EnvFilter::new("shelf_watch=debug,info"),
            2 => EnvFilter::new("shelf_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // The digest may go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config, harvester: &Harvester) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let stats = load_statistics(harvester.storage())?;
    print_statistics(&stats);

    Ok(())
}

/// Composes the digest as of today and writes it out
fn handle_report(config: &Config, harvester: &Harvester) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let digest = compose_digest(harvester.storage(), today)?;

    tracing::info!(
        "Digest: {} books this week, {} more this month",
        digest.weekly.len(),
        digest.monthly.len()
    );

    write_digest(&digest, config.output.report_path.as_deref().map(Path::new))?;
    Ok(())
}
