//! Staff-Harvest main entry point
//!
//! This is the command-line interface for the Staff-Harvest directory scraper.

use clap::Parser;
use std::path::PathBuf;
use staff_harvest::config::{load_config_with_hash, validate, Config};
use staff_harvest::crawler::run_harvest;
use staff_harvest::model::PageRequest;
use staff_harvest::output::print_summary;
use staff_harvest::url::SearchUrl;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Staff-Harvest: a concurrent employee directory harvester
///
/// Without arguments, searches the directory for every letter a-z, merges
/// and deduplicates the results, and writes them as CSV and XLSX.
#[derive(Parser, Debug)]
#[command(name = "staff-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent employee directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search term to use instead of the configured ones (repeatable)
    #[arg(short, long = "term", value_name = "TERM")]
    terms: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and first-page URLs without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given; using built-in defaults");
            Config::default()
        }
    };

    if !cli.terms.is_empty() {
        config.scrape.terms = cli.terms.clone();
    }
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_harvest(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("staff_harvest=info,warn"),
            1 => EnvFilter::new("staff_harvest=debug,info"),
            2 => EnvFilter::new("staff_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Staff-Harvest Dry Run ===\n");

    println!("Fetcher Configuration:");
    println!("  Timeout per attempt: {}s", config.fetcher.timeout_secs);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Initial backoff: {}ms", config.fetcher.initial_backoff_ms);
    println!(
        "  Max concurrent requests: {}",
        config.fetcher.max_concurrent_requests
    );
    println!("  Default page size: {}", config.fetcher.default_page_size);

    println!("\nScrape:");
    println!("  University: {}", config.scrape.university);
    println!("  Pagination: {}", config.scrape.pagination);
    match config.scrape.run_timeout_secs {
        Some(secs) => println!("  Run deadline: {}s", secs),
        None => println!("  Run deadline: none"),
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  XLSX: {}", config.output.xlsx_path);

    let urls = SearchUrl::new(&config.api)?;
    println!("\nTerms ({}):", config.scrape.terms.len());
    for term in &config.scrape.terms {
        println!("  - {}", urls.page_url(&PageRequest::new(term.as_str(), 1)));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops fetching; whatever was collected is still written
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing with partial results");
            interrupt.cancel();
        }
    });

    match run_harvest(config, &cancel).await {
        Ok(summary) => {
            tracing::info!("Harvest completed");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
