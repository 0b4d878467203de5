//! Configuration module for Staff-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not an error for the binary: [`Config::default`] describes
//! the full A-Z directory scrape.
//!
//! # Example
//!
//! ```no_run
//! use staff_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scraping {} terms", config.scrape.terms.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, FetcherConfig, OutputConfig, PaginationPolicy, ScrapeConfig,
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
