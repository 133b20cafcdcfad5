//! Crawl planning: how many pages to request.
//!
//! Two modes are supported:
//!
//! - **Fixed**: the page count is configured up front and no probe request
//!   is made.
//! - **Computed**: page 1 is fetched and the count is derived from its
//!   `pagination.total` and `pagination.limit`.
//!
//! ## Rounding
//!
//! | total | limit | `Ceil` | `Truncate` |
//! |-------|-------|--------|------------|
//! | 100   | 24    | 5      | 4          |
//! | 96    | 24    | 4      | 4          |
//! | 10    | 24    | 1      | 0          |
//! | 0     | 24    | 0      | 0          |
//!
//! `Truncate` skips the final partial page; it exists to reproduce earlier
//! crawl output and is not the default.

use std::ops::RangeInclusive;

use fsdb_core::AppConfig;
pub use fsdb_core::PageRounding;

use crate::error::PlanningError;
use crate::fetcher::{Fetcher, PageFetcher};
use crate::types::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    Fixed(u32),
    Computed(PageRounding),
}

impl PaginationMode {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        match config.crawl_total_pages {
            Some(pages) => Self::Fixed(pages),
            None => Self::Computed(config.crawl_page_rounding),
        }
    }
}

/// The page count for one run. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPlan {
    pub total_pages: u32,
}

impl CrawlPlan {
    /// Page numbers to crawl, starting at 1. Empty when `total_pages` is 0.
    #[must_use]
    pub fn pages(&self) -> RangeInclusive<u32> {
        1..=self.total_pages
    }
}

/// Derives the plan from a probed page's pagination metadata.
///
/// In [`PaginationMode::Fixed`] the metadata is ignored.
///
/// # Errors
///
/// - [`PlanningError::ZeroLimit`] when computed mode sees `limit == 0`.
/// - [`PlanningError::TooManyPages`] when the count does not fit in `u32`.
pub fn plan(first: &Pagination, mode: PaginationMode) -> Result<CrawlPlan, PlanningError> {
    let rounding = match mode {
        PaginationMode::Fixed(total_pages) => return Ok(CrawlPlan { total_pages }),
        PaginationMode::Computed(rounding) => rounding,
    };

    if first.limit == 0 {
        return Err(PlanningError::ZeroLimit { total: first.total });
    }

    let pages = match rounding {
        PageRounding::Ceil => first.total.div_ceil(first.limit),
        PageRounding::Truncate => first.total / first.limit,
    };

    let total_pages = u32::try_from(pages).map_err(|_| PlanningError::TooManyPages { pages })?;
    Ok(CrawlPlan { total_pages })
}

/// Produces the plan for a run, probing page 1 in computed mode.
///
/// # Errors
///
/// Returns [`PlanningError::Probe`] if page 1 cannot be fetched or decoded,
/// plus any error from [`plan`]. All planning errors are fatal to the run.
pub async fn plan_crawl<F: Fetcher>(
    fetcher: &PageFetcher<F>,
    mode: PaginationMode,
) -> Result<CrawlPlan, PlanningError> {
    if let PaginationMode::Fixed(total_pages) = mode {
        return Ok(CrawlPlan { total_pages });
    }

    let first = fetcher.fetch_page(1).await.map_err(PlanningError::Probe)?;
    let crawl_plan = plan(&first.pagination, mode)?;

    tracing::info!(
        total = first.pagination.total,
        limit = first.pagination.limit,
        total_pages = crawl_plan.total_pages,
        ?mode,
        "computed crawl plan"
    );

    Ok(crawl_plan)
}
