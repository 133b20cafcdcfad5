use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the page count is derived from the API's reported `total` and `limit`.
///
/// `Truncate` reproduces the integer division used by the first crawler
/// deployment, which drops the final partial page whenever `total` is not a
/// multiple of `limit`. `Ceil` counts that partial page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRounding {
    #[default]
    Ceil,
    Truncate,
}

impl FromStr for PageRounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ceil" => Ok(Self::Ceil),
            "truncate" => Ok(Self::Truncate),
            other => Err(format!("expected \"ceil\" or \"truncate\", got \"{other}\"")),
        }
    }
}

impl std::fmt::Display for PageRounding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRounding::Ceil => write!(f, "ceil"),
            PageRounding::Truncate => write!(f, "truncate"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Listing endpoint without query string.
    pub crawl_base_url: String,
    pub crawl_city_id: u32,
    pub crawl_super_category_id: u32,
    /// Records per page requested from the API (`limit` query parameter).
    pub crawl_page_size: u32,
    /// Geographic center of the search.
    pub crawl_lat: f64,
    pub crawl_lng: f64,
    /// Upper bound on simultaneously in-flight page pipelines.
    pub crawl_max_in_flight: usize,
    /// When set, the crawl uses this fixed page count instead of probing page 1.
    pub crawl_total_pages: Option<u32>,
    pub crawl_page_rounding: PageRounding,
    pub crawl_request_timeout_secs: u64,
    pub crawl_store_timeout_secs: u64,
    pub crawl_user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("crawl_base_url", &self.crawl_base_url)
            .field("crawl_city_id", &self.crawl_city_id)
            .field("crawl_super_category_id", &self.crawl_super_category_id)
            .field("crawl_page_size", &self.crawl_page_size)
            .field("crawl_lat", &self.crawl_lat)
            .field("crawl_lng", &self.crawl_lng)
            .field("crawl_max_in_flight", &self.crawl_max_in_flight)
            .field("crawl_total_pages", &self.crawl_total_pages)
            .field("crawl_page_rounding", &self.crawl_page_rounding)
            .field(
                "crawl_request_timeout_secs",
                &self.crawl_request_timeout_secs,
            )
            .field("crawl_store_timeout_secs", &self.crawl_store_timeout_secs)
            .field("crawl_user_agent", &self.crawl_user_agent)
            .finish()
    }
}
