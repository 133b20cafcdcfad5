//! The `crawl` command.
//!
//! Plans the run, records it in `crawl_runs`, then hands pages to the
//! bounded scheduler in [`runner`]. Only planning failures and a run where
//! every planned page failed are reported as errors; everything else ends
//! up in the summary.

mod reconcile;
mod runner;
mod store;

use fsdb_core::AppConfig;
use fsdb_db::CrawlRunCounts;
use fsdb_scraper::{plan_crawl, ListingQuery, LoziClient, PageFetcher, PaginationMode};
use sqlx::PgPool;

use self::runner::{run_crawl, CrawlOptions, CrawlSummary};

/// Runs one crawl.
///
/// `pages` forces fixed pagination with that many pages. With `dry_run` the
/// plan is computed and printed but nothing is written.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, the run row cannot
/// be created or started, planning fails, or every planned page fails.
pub(crate) async fn run_crawl_command(
    pool: &PgPool,
    config: &AppConfig,
    pages: Option<u32>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let client = LoziClient::new(config.crawl_request_timeout_secs, &config.crawl_user_agent)?;
    let fetcher = PageFetcher::new(client, ListingQuery::from_app_config(config));
    let mode = pages.map_or_else(
        || PaginationMode::from_app_config(config),
        PaginationMode::Fixed,
    );

    if dry_run {
        let plan = plan_crawl(&fetcher, mode).await?;
        println!(
            "dry-run: would crawl {} pages ({mode:?}) with up to {} in flight",
            plan.total_pages,
            config.crawl_max_in_flight.max(1)
        );
        return Ok(());
    }

    let run = fsdb_db::create_crawl_run(pool, "cli").await?;
    if let Err(e) = fsdb_db::start_crawl_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, CrawlRunCounts::default(), format!("{e:#}")).await;
        return Err(e.into());
    }

    let plan = match plan_crawl(&fetcher, mode).await {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(run_id = run.id, error = %e, "crawl planning failed");
            fail_run_best_effort(
                pool,
                run.id,
                CrawlRunCounts::default(),
                format!("planning failed: {e}"),
            )
            .await;
            return Err(e.into());
        }
    };

    tracing::info!(
        run_id = run.id,
        total_pages = plan.total_pages,
        max_in_flight = config.crawl_max_in_flight,
        "starting crawl"
    );

    let options = CrawlOptions {
        run_id: Some(run.id),
        ..CrawlOptions::from_app_config(config)
    };
    let summary = run_crawl(&fetcher, pool, plan, &options).await;
    log_summary(run.id, &summary);

    let counts = summary.to_run_counts();
    if summary.all_pages_failed() {
        let message = format!("all {} planned pages failed", summary.pages_planned);
        fail_run_best_effort(pool, run.id, counts, message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = fsdb_db::complete_crawl_run(pool, run.id, counts).await {
        fail_run_best_effort(pool, run.id, counts, format!("{err:#}")).await;
        return Err(err.into());
    }

    println!(
        "crawled {}/{} pages: {} inserted, {} updated, {} rejected, {} failed",
        summary.pages_succeeded,
        summary.pages_planned,
        summary.records_inserted,
        summary.records_updated,
        summary.records_rejected,
        summary.records_failed
    );
    Ok(())
}

fn log_summary(run_id: i64, summary: &CrawlSummary) {
    tracing::info!(
        run_id,
        pages_planned = summary.pages_planned,
        pages_succeeded = summary.pages_succeeded,
        pages_failed_fetch = summary.pages_failed_fetch,
        pages_failed_decode = summary.pages_failed_decode,
        records_seen = summary.records_seen,
        records_inserted = summary.records_inserted,
        records_updated = summary.records_updated,
        records_rejected = summary.records_rejected,
        records_failed = summary.records_failed,
        "crawl finished"
    );

    if summary.pages_failed() > 0 {
        tracing::warn!(
            run_id,
            pages_failed = summary.pages_failed(),
            pages_planned = summary.pages_planned,
            "some pages failed during the crawl"
        );
    }
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, counts: CrawlRunCounts, message: String) {
    if let Err(mark_err) = fsdb_db::fail_crawl_run(pool, run_id, counts, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark crawl run as failed"
        );
    }
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
