use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid listing base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("page numbers start at 1, got {page}")]
    InvalidPage { page: u32 },
}

impl ScraperError {
    /// `true` for failures of the network/HTTP layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScraperError::Http(_)
                | ScraperError::NotFound { .. }
                | ScraperError::UnexpectedStatus { .. }
        )
    }

    /// `true` when the response arrived but its body was not a valid page.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, ScraperError::Deserialize { .. })
    }
}

/// Fatal errors raised while deciding how many pages to crawl.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("failed to fetch page 1 to determine the page count: {0}")]
    Probe(#[source] ScraperError),

    #[error("API reported a page limit of 0 (total {total}); cannot derive a page count")]
    ZeroLimit { total: u64 },

    #[error("computed page count {pages} exceeds the supported maximum")]
    TooManyPages { pages: u64 },
}
