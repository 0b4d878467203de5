//! Run summary
//!
//! Collects the counters of a finished harvest and prints them in the
//! same plain layout as the rest of the console output.

use crate::crawler::HarvestReport;
use crate::model::Dataset;
use chrono::{DateTime, Utc};

/// Summary of one harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Terms searched
    pub terms: usize,

    /// Terms skipped because their first page failed
    pub skipped_terms: Vec<String>,

    /// Pages announced across all terms
    pub total_pages: u64,

    /// Pages whose retries were exhausted
    pub pages_failed: u64,

    /// Rows before deduplication
    pub raw_rows: usize,

    /// Rows written
    pub unique_rows: usize,

    /// Whether the fetch phase was cut short
    pub cancelled: bool,

    /// Files written, as (format, path)
    pub outputs: Vec<(String, String)>,
}

impl RunSummary {
    /// Starts a summary from the fetch report
    pub fn new(report: &HarvestReport, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            terms: report.terms.len(),
            skipped_terms: report
                .skipped_terms()
                .into_iter()
                .map(String::from)
                .collect(),
            total_pages: report.total_pages(),
            pages_failed: report.pages_failed(),
            raw_rows: report.raw_rows(),
            unique_rows: 0,
            cancelled: report.cancelled,
            outputs: Vec::new(),
        }
    }

    /// Records the assembled dataset and the files written from it
    pub fn finish(&mut self, dataset: &Dataset, outputs: Vec<(String, String)>) {
        self.unique_rows = dataset.len();
        self.outputs = outputs;
        self.finished_at = Utc::now();
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Rows removed by deduplication
    pub fn duplicates_removed(&self) -> usize {
        self.raw_rows.saturating_sub(self.unique_rows)
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Terms searched: {}", summary.terms);
    println!("  Pages announced: {}", summary.total_pages);
    println!("  Pages failed: {}", summary.pages_failed);
    println!();

    if !summary.skipped_terms.is_empty() {
        println!("Skipped Terms ({}):", summary.skipped_terms.len());
        for term in &summary.skipped_terms {
            println!("  - {}", term);
        }
        println!();
    }

    println!("Rows:");
    println!("  Scraped: {}", summary.raw_rows);
    println!("  Duplicates removed: {}", summary.duplicates_removed());
    println!("  Unique employees: {}", summary.unique_rows);
    println!();

    if summary.cancelled {
        println!("Fetching was cut short; the files contain partial results.");
        println!();
    }

    if summary.unique_rows == 0 {
        println!("No data scraped.");
    }

    for (format, path) in &summary.outputs {
        println!("Wrote {}: {}", format, path);
    }
}
