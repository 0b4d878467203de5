use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Portal endpoint every built-in request goes to
pub const DEFAULT_BASE_URL: &str = "https://www.ntnu.edu/sok";

/// Desktop browser identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Main configuration structure for Staff-Harvest
///
/// Every section is optional in TOML; missing keys fall back to the
/// built-in directory scrape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetcher: FetcherConfig,
    pub scrape: ScrapeConfig,
    pub output: OutputConfig,
}

/// Search endpoint and request identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Search endpoint without a query string
    pub base_url: String,

    /// Query parameters sent with every request, before `query` and `pageNr`
    pub fixed_params: Vec<(String, String)>,

    /// User-Agent header value
    pub user_agent: String,

    /// Accept header value
    pub accept: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let fixed_params = [
            ("p_p_id", "ntnusearchpage_WAR_ntnusearchportlet"),
            ("p_p_lifecycle", "2"),
            ("p_p_state", "normal"),
            ("p_p_mode", "view"),
            ("p_p_resource_id", "search"),
            ("p_p_cacheability", "cacheLevelPage"),
            ("category", "employee"),
            ("sort", "alpha"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fixed_params,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: "application/json".to_string(),
        }
    }
}

/// Per-request behavior of the page fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Timeout for a single attempt (seconds)
    pub timeout_secs: u64,

    /// Attempts per page before giving up
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds), doubled after each retry
    pub initial_backoff_ms: u64,

    /// Ceiling on in-flight requests across the whole run
    pub max_concurrent_requests: u32,

    /// Page size assumed when the response omits `pageSize`
    pub default_page_size: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_concurrent_requests: 10,
            default_page_size: 10,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// How a term's pages are walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationPolicy {
    /// Fetch pages 2..=total concurrently; an empty page contributes zero rows
    #[default]
    Concurrent,

    /// Fetch pages one at a time and stop at the first page without documents
    Sequential,
}

impl fmt::Display for PaginationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrent => write!(f, "concurrent"),
            Self::Sequential => write!(f, "sequential"),
        }
    }
}

/// What to search for and how
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScrapeConfig {
    /// Query terms, each driving its own pagination
    pub terms: Vec<String>,

    /// Value written to the University column of every row
    pub university: String,

    /// Pagination policy applied to every term
    pub pagination: PaginationPolicy,

    /// Pause between pages in sequential mode (milliseconds)
    pub page_delay_ms: u64,

    /// Overall deadline for the fetch phase (seconds)
    pub run_timeout_secs: Option<u64>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            terms: ('a'..='z').map(String::from).collect(),
            university: "NTNU".to_string(),
            pagination: PaginationPolicy::default(),
            page_delay_ms: 1000,
            run_timeout_secs: None,
        }
    }
}

impl ScrapeConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV table
    pub csv_path: String,

    /// Path to the XLSX workbook
    pub xlsx_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "ntnu_employees.csv".to_string(),
            xlsx_path: "ntnu_employees.xlsx".to_string(),
        }
    }
}
