use std::time::Duration;

use fsdb_scraper::{normalize_eatery, Eatery};

use super::store::{EateryStore, StoreError, UpsertOutcome};

/// Normalizes one decoded listing and upserts it by `external_id`,
/// stamping the row with `run_id`.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] if the store does not answer within
/// `timeout`, or [`StoreError::Db`] if the write fails. Either way only this
/// record is affected.
pub(crate) async fn reconcile<S: EateryStore>(
    store: &S,
    eatery: Eatery,
    run_id: Option<i64>,
    timeout: Duration,
) -> Result<UpsertOutcome, StoreError> {
    let normalized = normalize_eatery(eatery);
    match tokio::time::timeout(timeout, store.upsert(&normalized, run_id)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout { after: timeout }),
    }
}
