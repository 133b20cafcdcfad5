use fsdb_db::CrawlRunRow;
use sqlx::PgPool;

/// Prints the most recent crawl runs, newest first.
///
/// # Errors
///
/// Returns an error if the runs cannot be loaded.
pub(crate) async fn print_recent_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = fsdb_db::list_crawl_runs(pool, limit.max(1)).await?;
    if runs.is_empty() {
        println!("no crawl runs recorded");
        return Ok(());
    }

    for run in &runs {
        println!("{}", format_run(run));
    }
    Ok(())
}

fn format_run(run: &CrawlRunRow) -> String {
    let started = run
        .started_at
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
    let mut line = format!(
        "#{id} {status:<9} {started}  pages {ok}/{planned} ({failed} failed)  \
         +{inserted} ~{updated} rejected {rejected} failed {records_failed}",
        id = run.id,
        status = run.status,
        ok = run.pages_succeeded,
        planned = run.pages_planned,
        failed = run.pages_failed,
        inserted = run.records_inserted,
        updated = run.records_updated,
        rejected = run.records_rejected,
        records_failed = run.records_failed,
    );
    if let Some(message) = &run.error_message {
        line.push_str("  error: ");
        line.push_str(message);
    }
    line
}
