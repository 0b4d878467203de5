use crate::config::types::{ApiConfig, Config, FetcherConfig, OutputConfig, ScrapeConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_scrape_config(&config.scrape)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the search endpoint and request identity
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTPS scheme",
            config.base_url
        )));
    }

    if url.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must not carry a query string; use fixed_params",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (key, _) in &config.fixed_params {
        if key.is_empty() {
            return Err(ConfigError::Validation(
                "fixed_params keys cannot be empty".to_string(),
            ));
        }
        if key == "query" || key == "pageNr" {
            return Err(ConfigError::Validation(format!(
                "fixed_params must not set '{}', it is filled per request",
                key
            )));
        }
    }

    Ok(())
}

/// Validates fetcher limits
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.default_page_size < 1 {
        return Err(ConfigError::Validation(
            "default_page_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates terms and row constants
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.terms.is_empty() {
        return Err(ConfigError::Validation(
            "at least one search term is required".to_string(),
        ));
    }

    if config.terms.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "search terms cannot be empty".to_string(),
        ));
    }

    if config.university.trim().is_empty() {
        return Err(ConfigError::Validation(
            "university cannot be empty".to_string(),
        ));
    }

    if config.run_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "run_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation("csv_path cannot be empty".to_string()));
    }

    if config.xlsx_path.is_empty() {
        return Err(ConfigError::Validation(
            "xlsx_path cannot be empty".to_string(),
        ));
    }

    if config.csv_path == config.xlsx_path {
        return Err(ConfigError::Validation(
            "csv_path and xlsx_path must differ".to_string(),
        ));
    }

    Ok(())
}
