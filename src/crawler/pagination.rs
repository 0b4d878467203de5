//! Per-term pagination
//!
//! Page 1 of a term tells us how many pages exist. The remaining pages are
//! then fetched either all at once (every fetch still waits on the shared
//! gate) or one after another, depending on [`PaginationPolicy`].

use crate::config::{Config, PaginationPolicy};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::model::{map_documents, EmployeeRow, PageRequest};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything one term produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermReport {
    /// The query term
    pub term: String,

    /// Pages announced by page 1 (0 if page 1 itself failed)
    pub total_pages: u32,

    /// Pages that returned a payload
    pub pages_fetched: u32,

    /// Pages whose retries were exhausted
    pub pages_failed: u32,

    /// Whether cancellation cut the term short
    pub cancelled: bool,

    /// Mapped rows from every fetched page
    pub rows: Vec<EmployeeRow>,
}

impl TermReport {
    fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            ..Self::default()
        }
    }

    /// Folds one page outcome into the report, returning the page's document count
    fn record(&mut self, outcome: FetchOutcome, university: &str) -> Option<usize> {
        match outcome {
            FetchOutcome::Page(page) => {
                self.pages_fetched += 1;
                self.rows.extend(map_documents(&page.docs, university));
                Some(page.docs.len())
            }
            FetchOutcome::Failed { .. } => {
                self.pages_failed += 1;
                None
            }
            FetchOutcome::Cancelled => {
                self.cancelled = true;
                None
            }
        }
    }
}

/// Drives pagination for one term at a time
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    fetcher: PageFetcher,
    policy: PaginationPolicy,
    university: String,
    default_page_size: u64,
    page_delay: Duration,
}

impl PaginationDriver {
    pub fn new(fetcher: PageFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            policy: config.scrape.pagination,
            university: config.scrape.university.clone(),
            default_page_size: config.fetcher.default_page_size,
            page_delay: config.scrape.page_delay(),
        }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Scrapes every page of `term`
    ///
    /// A failed page 1 skips the term. Failed later pages contribute no
    /// rows and never stop their siblings.
    pub async fn scrape_term(&self, term: &str, cancel: &CancellationToken) -> TermReport {
        let mut report = TermReport::new(term);

        let first = match self.fetcher.fetch(&PageRequest::new(term, 1), cancel).await {
            FetchOutcome::Page(page) => page,
            FetchOutcome::Failed { attempts, last_error } => {
                tracing::warn!(term, attempts, error = %last_error, "Skipping term: first page failed");
                report.pages_failed = 1;
                return report;
            }
            FetchOutcome::Cancelled => {
                report.cancelled = true;
                return report;
            }
        };

        report.total_pages = first.total_pages(self.default_page_size);
        let first_docs = first.docs.len();
        report.record(FetchOutcome::Page(first), &self.university);

        match self.policy {
            PaginationPolicy::Concurrent => self.fetch_concurrent(&mut report, cancel).await,
            PaginationPolicy::Sequential if first_docs > 0 => {
                self.fetch_sequential(&mut report, cancel).await
            }
            PaginationPolicy::Sequential => {}
        }

        tracing::info!(
            "Term '{}': pages={}, rows={}, failed={}",
            term,
            report.total_pages,
            report.rows.len(),
            report.pages_failed
        );

        report
    }

    /// Fetches pages 2..=total concurrently; empty pages simply add nothing
    ///
    /// Requests are created lazily, at most a gate's worth ahead of the
    /// oldest unfinished page, so a huge announced total costs no memory
    /// up front. Rows keep page order.
    async fn fetch_concurrent(&self, report: &mut TermReport, cancel: &CancellationToken) {
        if report.total_pages < 2 {
            return;
        }

        let term = report.term.clone();
        let lookahead = self.fetcher.gate().ceiling();
        let mut outcomes = stream::iter(2..=report.total_pages)
            .map(|page| {
                let request = PageRequest::new(term.as_str(), page);
                async move { self.fetcher.fetch(&request, cancel).await }
            })
            .buffered(lookahead);

        while let Some(outcome) = outcomes.next().await {
            let cancelled = matches!(outcome, FetchOutcome::Cancelled);
            report.record(outcome, &self.university);
            if cancelled {
                return;
            }
        }
    }

    /// Fetches pages 2..=total in order, pausing between them and stopping
    /// at the first page without documents
    async fn fetch_sequential(&self, report: &mut TermReport, cancel: &CancellationToken) {
        for page in 2..=report.total_pages {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    return;
                }
                _ = tokio::time::sleep(self.page_delay) => {}
            }

            let request = PageRequest::new(report.term.as_str(), page);
            let outcome = self.fetcher.fetch(&request, cancel).await;
            let cancelled = matches!(outcome, FetchOutcome::Cancelled);

            match report.record(outcome, &self.university) {
                Some(0) => {
                    tracing::debug!(term = %report.term, page, "Empty page; stopping");
                    return;
                }
                None if cancelled => return,
                _ => {}
            }
        }
    }
}
