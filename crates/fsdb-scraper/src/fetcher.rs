//! Page fetching: URL construction, the transport seam, and decoding.

use std::future::Future;

use fsdb_core::AppConfig;

use crate::decode::decode_page;
use crate::error::ScraperError;
use crate::types::EateriesPage;

/// Transport capability: fetch the raw body at `url`.
///
/// [`crate::LoziClient`] is the production implementation; tests substitute
/// scripted fakes.
pub trait Fetcher {
    /// Performs one GET and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns a transport-class [`ScraperError`] (see
    /// [`ScraperError::is_transport`]) when the request fails or the server
    /// answers with a non-success status.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ScraperError>> + Send;
}

impl<T: Fetcher + Sync> Fetcher for &T {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ScraperError>> + Send {
        (**self).fetch(url)
    }
}

/// The fixed part of the listing query. Only `page` varies between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub base_url: String,
    pub city_id: u32,
    pub super_category_id: u32,
    /// Records per page (`limit` query parameter).
    pub limit: u32,
    pub lat: f64,
    pub lng: f64,
}

impl ListingQuery {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.crawl_base_url.clone(),
            city_id: config.crawl_city_id,
            super_category_id: config.crawl_super_category_id,
            limit: config.crawl_page_size,
            lat: config.crawl_lat,
            lng: config.crawl_lng,
        }
    }

    /// Builds the URL for `page`, with `page` as the last query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn page_url(&self, page: u32) -> Result<String, ScraperError> {
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("cityId", &self.city_id.to_string())
            .append_pair("limit", &self.limit.to_string())
            .append_pair("superCategoryId", &self.super_category_id.to_string())
            .append_pair("lat", &self.lat.to_string())
            .append_pair("lng", &self.lng.to_string())
            .append_pair("page", &page.to_string());

        Ok(url.to_string())
    }
}

/// Fetches and decodes listing pages through a [`Fetcher`].
pub struct PageFetcher<F> {
    transport: F,
    query: ListingQuery,
}

impl<F: Fetcher> PageFetcher<F> {
    pub fn new(transport: F, query: ListingQuery) -> Self {
        Self { transport, query }
    }

    #[must_use]
    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    /// Fetches and decodes one page. All failures are scoped to this page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidPage`] for page 0.
    /// - [`ScraperError::InvalidBaseUrl`] if the query's base URL is invalid.
    /// - Transport errors from the [`Fetcher`].
    /// - [`ScraperError::Deserialize`] if the body is not a valid page.
    pub async fn fetch_page(&self, page: u32) -> Result<EateriesPage, ScraperError> {
        if page == 0 {
            return Err(ScraperError::InvalidPage { page });
        }

        let url = self.query.page_url(page)?;
        let body = self.transport.fetch(&url).await?;
        let decoded = decode_page(&body, page)?;

        tracing::debug!(
            page,
            reported_page = decoded.pagination.page,
            total = decoded.pagination.total,
            limit = decoded.pagination.limit,
            next_url = decoded.pagination.next_url.as_deref(),
            records = decoded.records.len(),
            rejected = decoded.rejected.len(),
            "decoded eateries page"
        );

        Ok(decoded)
    }
}
