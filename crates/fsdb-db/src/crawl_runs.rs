//! Database operations for `crawl_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const CRAWL_RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     pages_planned, pages_succeeded, pages_failed, records_inserted, records_updated, \
     records_rejected, records_failed, error_message, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `crawl_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrawlRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pages_planned: i32,
    pub pages_succeeded: i32,
    pub pages_failed: i32,
    pub records_inserted: i32,
    pub records_updated: i32,
    pub records_rejected: i32,
    pub records_failed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters written when a run finishes, successfully or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlRunCounts {
    pub pages_planned: i32,
    pub pages_succeeded: i32,
    pub pages_failed: i32,
    pub records_inserted: i32,
    pub records_updated: i32,
    pub records_rejected: i32,
    pub records_failed: i32,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Creates a new crawl run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_crawl_run(pool: &PgPool, trigger_source: &str) -> Result<CrawlRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "INSERT INTO crawl_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING {CRAWL_RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_crawl_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCrawlRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_crawl_run(
    pool: &PgPool,
    id: i64,
    counts: CrawlRunCounts,
) -> Result<(), DbError> {
    finish_crawl_run(pool, id, "succeeded", counts, None).await
}

/// Marks a run as `failed` with `error_message` and whatever counters were
/// gathered before the failure.
///
/// # Errors
///
/// Returns [`DbError::InvalidCrawlRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_crawl_run(
    pool: &PgPool,
    id: i64,
    counts: CrawlRunCounts,
    error_message: &str,
) -> Result<(), DbError> {
    finish_crawl_run(pool, id, "failed", counts, Some(error_message)).await
}

async fn finish_crawl_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    counts: CrawlRunCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crawl_runs SET \
             status = $1, completed_at = NOW(), error_message = $2, \
             pages_planned = $3, pages_succeeded = $4, pages_failed = $5, \
             records_inserted = $6, records_updated = $7, records_rejected = $8, \
             records_failed = $9 \
         WHERE id = $10 AND status = 'running'",
    )
    .bind(status)
    .bind(error_message)
    .bind(counts.pages_planned)
    .bind(counts.pages_succeeded)
    .bind(counts.pages_failed)
    .bind(counts.records_inserted)
    .bind(counts.records_updated)
    .bind(counts.records_rejected)
    .bind(counts.records_failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCrawlRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_crawl_run(pool: &PgPool, id: i64) -> Result<CrawlRunRow, DbError> {
    let row = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_crawl_runs(pool: &PgPool, limit: i64) -> Result<Vec<CrawlRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CrawlRunRow>(&format!(
        "SELECT {CRAWL_RUN_COLUMNS} FROM crawl_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
