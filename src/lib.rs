//! Staff-Harvest: a concurrent employee directory harvester
//!
//! This crate pages through a university portal's JSON employee search,
//! flattens every record into a fixed row schema, deduplicates the result
//! and writes it out as CSV and XLSX tables.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Staff-Harvest operations
///
/// Only startup and output failures end up here. Failures of individual
/// page fetches are absorbed by the scraper and reported as
/// [`crawler::FetchOutcome::Failed`].
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Staff-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, PaginationPolicy};
pub use model::{assemble, map_documents, Dataset, EmployeeRow, RawDocument, SearchPage};
pub use crawler::{run_harvest, FetchOutcome, Harvester, TermReport};
