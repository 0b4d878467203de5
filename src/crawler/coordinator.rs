//! Harvest coordinator - main fetch orchestration logic
//!
//! This module wires the shared pieces of a run together:
//! - One HTTP client and one admission gate for every request
//! - One pagination driver per term, all running concurrently
//! - An optional run deadline that cancels outstanding fetches
//!
//! Rows are only flattened here; deduplication happens afterwards.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::gate::AdmissionGate;
use crate::crawler::pagination::{PaginationDriver, TermReport};
use crate::model::EmployeeRow;
use crate::url::SearchUrl;
use crate::HarvestError;
use futures::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Combined result of every term in a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestReport {
    /// Per-term reports, in configured term order
    pub terms: Vec<TermReport>,

    /// Whether the run deadline or an interrupt cut the fetch phase short
    pub cancelled: bool,
}

impl HarvestReport {
    /// Pages announced across all terms
    pub fn total_pages(&self) -> u64 {
        self.terms.iter().map(|t| u64::from(t.total_pages)).sum()
    }

    /// Pages whose retries were exhausted
    pub fn pages_failed(&self) -> u64 {
        self.terms.iter().map(|t| u64::from(t.pages_failed)).sum()
    }

    /// Rows before deduplication
    pub fn raw_rows(&self) -> usize {
        self.terms.iter().map(|t| t.rows.len()).sum()
    }

    /// Terms whose first page could not be fetched
    pub fn skipped_terms(&self) -> Vec<&str> {
        self.terms
            .iter()
            .filter(|t| t.total_pages == 0 && !t.cancelled)
            .map(|t| t.term.as_str())
            .collect()
    }

    /// Flattens every term's rows into one sequence
    pub fn into_rows(self) -> Vec<EmployeeRow> {
        self.terms.into_iter().flat_map(|t| t.rows).collect()
    }
}

/// Main harvest coordinator
#[derive(Debug, Clone)]
pub struct Harvester {
    driver: PaginationDriver,
    terms: Vec<String>,
    run_timeout: Option<Duration>,
}

impl Harvester {
    /// Creates a coordinator from an explicit configuration
    ///
    /// The configuration is not re-validated here; callers loading from
    /// disk go through [`crate::config::load_config`].
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Client, gate and driver are ready
    /// * `Err(HarvestError)` - The HTTP client or base URL could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(config).map_err(HarvestError::Client)?;
        let urls = SearchUrl::new(&config.api)?;
        let gate = AdmissionGate::new(config.fetcher.max_concurrent_requests as usize);
        let fetcher = PageFetcher::new(client, urls, gate, &config.fetcher);

        Ok(Self {
            driver: PaginationDriver::new(fetcher, config),
            terms: config.scrape.terms.clone(),
            run_timeout: config.scrape.run_timeout(),
        })
    }

    /// The gate shared by every fetch of this harvester
    pub fn gate(&self) -> &AdmissionGate {
        self.driver.fetcher().gate()
    }

    /// Scrapes every configured term concurrently
    ///
    /// Cancelling `cancel` (or reaching the configured deadline) stops
    /// outstanding fetches and closes the gate; rows gathered until then are
    /// still returned. A cancelled harvester admits no further requests.
    pub async fn run(&self, cancel: &CancellationToken) -> HarvestReport {
        let run_cancel = cancel.child_token();

        let watcher = {
            let token = run_cancel.clone();
            let gate = self.gate().clone();
            let run_timeout = self.run_timeout;
            tokio::spawn(async move {
                match run_timeout {
                    Some(timeout) => tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(timeout) => {
                            tracing::warn!("Run deadline of {:?} reached; cancelling fetches", timeout);
                            token.cancel();
                        }
                    },
                    None => token.cancelled().await,
                }
                gate.close();
            })
        };

        tracing::info!(
            "Scraping {} terms with at most {} requests in flight",
            self.terms.len(),
            self.gate().ceiling()
        );

        let terms = join_all(
            self.terms
                .iter()
                .map(|term| self.driver.scrape_term(term, &run_cancel)),
        )
        .await;

        watcher.abort();
        if run_cancel.is_cancelled() {
            self.gate().close();
        }

        HarvestReport {
            cancelled: terms.iter().any(|t| t.cancelled),
            terms,
        }
    }
}
