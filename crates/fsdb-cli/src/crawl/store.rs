//! Persistence seam for the crawl.
//!
//! The crawl only needs a handful of operations keyed by `external_id`, so
//! it talks to an [`EateryStore`] rather than to Postgres directly. Tests
//! substitute an in-memory store.

use std::future::Future;
use std::time::Duration;

use fsdb_core::NormalizedEatery;
use fsdb_db::DbError;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("store call timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Storage capability for normalized eateries. `external_id` matching is
/// exact.
pub trait EateryStore: Sync {
    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<NormalizedEatery>, DbError>> + Send;

    /// Writes go through with the id of the crawl run that saw the record,
    /// if there is one.
    fn insert(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Replaces every field of the stored eatery with the same `external_id`.
    fn update(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Inserts `eatery` or fully replaces the stored one.
    ///
    /// The default is a lookup followed by an insert or update. Two writers
    /// racing on the same new `external_id` can both see "absent"; stores
    /// with an atomic conditional write should override this.
    fn upsert(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> impl Future<Output = Result<UpsertOutcome, DbError>> + Send {
        async move {
            if self
                .find_by_external_id(&eatery.external_id)
                .await?
                .is_some()
            {
                self.update(eatery, run_id).await?;
                Ok(UpsertOutcome::Updated)
            } else {
                self.insert(eatery, run_id).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

impl EateryStore for PgPool {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<NormalizedEatery>, DbError> {
        let row = fsdb_db::find_eatery_by_external_id(self, external_id).await?;
        Ok(row.map(NormalizedEatery::from))
    }

    async fn insert(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> Result<(), DbError> {
        fsdb_db::insert_eatery(self, eatery, run_id).await
    }

    async fn update(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> Result<(), DbError> {
        fsdb_db::update_eatery(self, eatery, run_id).await
    }

    async fn upsert(
        &self,
        eatery: &NormalizedEatery,
        run_id: Option<i64>,
    ) -> Result<UpsertOutcome, DbError> {
        let is_new = fsdb_db::upsert_eatery(self, eatery, run_id).await?;
        Ok(if is_new {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }
}
