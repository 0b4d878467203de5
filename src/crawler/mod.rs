//! Crawler module for directory page fetching and assembly
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - A run-wide admission gate bounding in-flight requests
//! - Per-term pagination
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod gate;
mod pagination;

pub use coordinator::{HarvestReport, Harvester};
pub use fetcher::{build_http_client, FetchError, FetchOutcome, PageFetcher};
pub use gate::AdmissionGate;
pub use pagination::{PaginationDriver, TermReport};

use crate::config::Config;
use crate::model::assemble;
use crate::output::{configured_sinks, write_all, RunSummary};
use crate::HarvestError;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client and admission gate
/// 2. Scrape every configured term concurrently
/// 3. Deduplicate and sort the collected rows
/// 4. Write the CSV and XLSX tables, even when no rows were found
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Cancels outstanding fetches; partial results are still written
///
/// # Returns
///
/// * `Ok(RunSummary)` - Harvest completed and files were written
/// * `Err(HarvestError)` - Client construction or writing failed
pub async fn run_harvest(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<RunSummary, HarvestError> {
    let started_at = Utc::now();
    let harvester = Harvester::new(config)?;

    let report = harvester.run(cancel).await;
    if report.cancelled {
        tracing::warn!("Fetching was cancelled; writing partial results");
    }

    let mut summary = RunSummary::new(&report, started_at);
    let dataset = assemble(report.into_rows());
    tracing::info!(
        "Assembled {} unique employees from {} rows",
        dataset.len(),
        summary.raw_rows
    );

    let outputs = write_all(&dataset, &configured_sinks(&config.output))?;
    summary.finish(&dataset, outputs);

    Ok(summary)
}
