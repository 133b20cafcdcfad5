//! Bounded-concurrency page scheduler.
//!
//! Pages `1..=total_pages` are admitted in increasing order through
//! `buffer_unordered`, so at most `max_in_flight` page pipelines
//! (fetch, decode, reconcile every record) run at once and a new page is
//! admitted only when one finishes. Failures are scoped: a page failure
//! never stops other pages and a record failure never stops its siblings.

use std::time::Duration;

use fsdb_core::AppConfig;
use fsdb_db::CrawlRunCounts;
use fsdb_scraper::{CrawlPlan, Fetcher, PageFetcher, ScraperError};
use futures::stream::{self, StreamExt};

use super::reconcile::reconcile;
use super::store::{EateryStore, UpsertOutcome};

#[derive(Debug, Clone, Copy)]
pub(crate) struct CrawlOptions {
    /// Clamped to at least 1 by [`run_crawl`].
    pub max_in_flight: usize,
    pub store_timeout: Duration,
    /// Crawl run recorded on every row this crawl writes.
    pub run_id: Option<i64>,
}

impl CrawlOptions {
    pub(crate) fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_in_flight: config.crawl_max_in_flight,
            store_timeout: Duration::from_secs(config.crawl_store_timeout_secs),
            run_id: None,
        }
    }
}

/// End-of-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CrawlSummary {
    pub pages_planned: u32,
    pub pages_succeeded: u32,
    /// Request-level failures: network, timeout, non-2xx, bad URL.
    pub pages_failed_fetch: u32,
    /// Body was not a valid listing page.
    pub pages_failed_decode: u32,
    /// Listings seen on successful pages, rejected ones included.
    pub records_seen: u64,
    pub records_inserted: u64,
    pub records_updated: u64,
    pub records_rejected: u64,
    pub records_failed: u64,
}

impl CrawlSummary {
    pub(crate) fn pages_failed(&self) -> u32 {
        self.pages_failed_fetch + self.pages_failed_decode
    }

    /// True when pages were planned and none of them succeeded.
    pub(crate) fn all_pages_failed(&self) -> bool {
        self.pages_planned > 0 && self.pages_succeeded == 0
    }

    pub(crate) fn to_run_counts(self) -> CrawlRunCounts {
        CrawlRunCounts {
            pages_planned: saturating_i32(u64::from(self.pages_planned)),
            pages_succeeded: saturating_i32(u64::from(self.pages_succeeded)),
            pages_failed: saturating_i32(u64::from(self.pages_failed())),
            records_inserted: saturating_i32(self.records_inserted),
            records_updated: saturating_i32(self.records_updated),
            records_rejected: saturating_i32(self.records_rejected),
            records_failed: saturating_i32(self.records_failed),
        }
    }

    fn absorb(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Completed(tally) => {
                self.pages_succeeded += 1;
                self.records_seen += tally.seen;
                self.records_inserted += tally.inserted;
                self.records_updated += tally.updated;
                self.records_rejected += tally.rejected;
                self.records_failed += tally.failed;
            }
            PageOutcome::FetchFailed => self.pages_failed_fetch += 1,
            PageOutcome::DecodeFailed => self.pages_failed_decode += 1,
        }
    }
}

fn saturating_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Debug, Default)]
struct PageTally {
    seen: u64,
    inserted: u64,
    updated: u64,
    rejected: u64,
    failed: u64,
}

#[derive(Debug)]
enum PageOutcome {
    Completed(PageTally),
    FetchFailed,
    DecodeFailed,
}

/// Crawls every page of `plan` and reconciles each listing into `store`.
///
/// Never fails as a whole; per-page and per-record failures are logged and
/// counted in the returned summary.
pub(crate) async fn run_crawl<F, S>(
    fetcher: &PageFetcher<F>,
    store: &S,
    plan: CrawlPlan,
    options: &CrawlOptions,
) -> CrawlSummary
where
    F: Fetcher,
    S: EateryStore,
{
    let max_in_flight = options.max_in_flight.max(1);
    let store_timeout = options.store_timeout;
    let run_id = options.run_id;

    let mut summary = CrawlSummary {
        pages_planned: plan.total_pages,
        ..CrawlSummary::default()
    };

    let mut outcomes = stream::iter(plan.pages())
        .map(|page| crawl_page(fetcher, store, page, run_id, store_timeout))
        .buffer_unordered(max_in_flight);

    while let Some(outcome) = outcomes.next().await {
        summary.absorb(outcome);
    }

    summary
}

async fn crawl_page<F, S>(
    fetcher: &PageFetcher<F>,
    store: &S,
    page: u32,
    run_id: Option<i64>,
    store_timeout: Duration,
) -> PageOutcome
where
    F: Fetcher,
    S: EateryStore,
{
    let decoded = match fetcher.fetch_page(page).await {
        Ok(decoded) => decoded,
        Err(error) => return page_failure(page, &error),
    };

    let mut tally = PageTally {
        seen: (decoded.records.len() + decoded.rejected.len()) as u64,
        rejected: decoded.rejected.len() as u64,
        ..PageTally::default()
    };

    // Payload order within a page.
    for eatery in decoded.records {
        let external_id = eatery.id;
        match reconcile(store, eatery, run_id, store_timeout).await {
            Ok(UpsertOutcome::Inserted) => tally.inserted += 1,
            Ok(UpsertOutcome::Updated) => tally.updated += 1,
            Err(error) => {
                tracing::warn!(page, external_id, error = %error, "failed to store eatery");
                tally.failed += 1;
            }
        }
    }

    tracing::debug!(
        page,
        inserted = tally.inserted,
        updated = tally.updated,
        rejected = tally.rejected,
        failed = tally.failed,
        "page complete"
    );

    PageOutcome::Completed(tally)
}

fn page_failure(page: u32, error: &ScraperError) -> PageOutcome {
    if error.is_decode() {
        tracing::warn!(page, error = %error, "page body could not be decoded");
        PageOutcome::DecodeFailed
    } else {
        tracing::warn!(page, error = %error, "page request failed");
        PageOutcome::FetchFailed
    }
}
