//! Database operations for the `eateries` table.
//!
//! Rows are keyed by `external_id`, the upstream listing id rendered as a
//! decimal string. The table carries a UNIQUE constraint on it, so
//! [`upsert_eatery`] is safe under concurrent writers.

use chrono::{DateTime, Utc};
use fsdb_core::NormalizedEatery;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use crate::DbError;

const EATERY_COLUMNS: &str = "id, public_id, external_id, name, avatar_url, phone, slug, \
     street, district, city, full_address, latitude, longitude, rating, \
     is_opening, is_opening_24h, minutes_until_next_status, is_active, is_closed, \
     operating_time_count, promotion_count, last_seen_run_id, created_at, updated_at";

/// A row from the `eateries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EateryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub external_id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub slug: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub is_opening: bool,
    pub is_opening_24h: bool,
    pub minutes_until_next_status: Option<i32>,
    pub is_active: bool,
    pub is_closed: bool,
    pub operating_time_count: i32,
    pub promotion_count: i32,
    /// The crawl run that last wrote this row, if any.
    pub last_seen_run_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EateryRow> for NormalizedEatery {
    fn from(row: EateryRow) -> Self {
        Self {
            external_id: row.external_id,
            name: row.name,
            avatar_url: row.avatar_url,
            phone: row.phone,
            slug: row.slug,
            street: row.street,
            district: row.district,
            city: row.city,
            full_address: row.full_address,
            latitude: row.latitude,
            longitude: row.longitude,
            rating: row.rating,
            is_opening: row.is_opening,
            is_opening_24h: row.is_opening_24h,
            minutes_until_next_status: row.minutes_until_next_status,
            is_active: row.is_active,
            is_closed: row.is_closed,
            operating_time_count: row.operating_time_count,
            promotion_count: row.promotion_count,
        }
    }
}

/// Binds every persisted field as `$1..$19`, `external_id` first, and the
/// run id as `$20`.
fn bind_fields<'q>(
    query: Query<'q, Postgres, PgArguments>,
    eatery: &'q NormalizedEatery,
    last_seen_run_id: Option<i64>,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&eatery.external_id)
        .bind(eatery.name.as_deref())
        .bind(eatery.avatar_url.as_deref())
        .bind(eatery.phone.as_deref())
        .bind(eatery.slug.as_deref())
        .bind(eatery.street.as_deref())
        .bind(eatery.district.as_deref())
        .bind(eatery.city.as_deref())
        .bind(eatery.full_address.as_deref())
        .bind(eatery.latitude)
        .bind(eatery.longitude)
        .bind(eatery.rating)
        .bind(eatery.is_opening)
        .bind(eatery.is_opening_24h)
        .bind(eatery.minutes_until_next_status)
        .bind(eatery.is_active)
        .bind(eatery.is_closed)
        .bind(eatery.operating_time_count)
        .bind(eatery.promotion_count)
        .bind(last_seen_run_id)
}

/// Looks up an eatery by exact `external_id` match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_eatery_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<EateryRow>, DbError> {
    let row = sqlx::query_as::<_, EateryRow>(&format!(
        "SELECT {EATERY_COLUMNS} FROM eateries WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new eatery row. Fails on a duplicate `external_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including unique
/// violations on `external_id`.
pub async fn insert_eatery(
    pool: &PgPool,
    eatery: &NormalizedEatery,
    last_seen_run_id: Option<i64>,
) -> Result<(), DbError> {
    bind_fields(
        sqlx::query(
            "INSERT INTO eateries \
                 (external_id, name, avatar_url, phone, slug, street, district, city, \
                  full_address, latitude, longitude, rating, is_opening, is_opening_24h, \
                  minutes_until_next_status, is_active, is_closed, operating_time_count, \
                  promotion_count, last_seen_run_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20)",
        ),
        eatery,
        last_seen_run_id,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Replaces every persisted field of the row matching `eatery.external_id`
/// and stamps it with `last_seen_run_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that `external_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_eatery(
    pool: &PgPool,
    eatery: &NormalizedEatery,
    last_seen_run_id: Option<i64>,
) -> Result<(), DbError> {
    let result = bind_fields(
        sqlx::query(
            "UPDATE eateries SET \
                 name = $2, avatar_url = $3, phone = $4, slug = $5, street = $6, \
                 district = $7, city = $8, full_address = $9, latitude = $10, \
                 longitude = $11, rating = $12, is_opening = $13, is_opening_24h = $14, \
                 minutes_until_next_status = $15, is_active = $16, is_closed = $17, \
                 operating_time_count = $18, promotion_count = $19, \
                 last_seen_run_id = $20, updated_at = NOW() \
             WHERE external_id = $1",
        ),
        eatery,
        last_seen_run_id,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Inserts or fully replaces the row for `eatery.external_id` in one
/// statement, stamping it with `last_seen_run_id`.
///
/// Returns `true` when the row was newly inserted and `false` when an
/// existing row was updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_eatery(
    pool: &PgPool,
    eatery: &NormalizedEatery,
    last_seen_run_id: Option<i64>,
) -> Result<bool, DbError> {
    let row = bind_fields(
        sqlx::query(
            "INSERT INTO eateries \
                 (external_id, name, avatar_url, phone, slug, street, district, city, \
                  full_address, latitude, longitude, rating, is_opening, is_opening_24h, \
                  minutes_until_next_status, is_active, is_closed, operating_time_count, \
                  promotion_count, last_seen_run_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20) \
             ON CONFLICT (external_id) DO UPDATE SET \
                 name                      = EXCLUDED.name, \
                 avatar_url                = EXCLUDED.avatar_url, \
                 phone                     = EXCLUDED.phone, \
                 slug                      = EXCLUDED.slug, \
                 street                    = EXCLUDED.street, \
                 district                  = EXCLUDED.district, \
                 city                      = EXCLUDED.city, \
                 full_address              = EXCLUDED.full_address, \
                 latitude                  = EXCLUDED.latitude, \
                 longitude                 = EXCLUDED.longitude, \
                 rating                    = EXCLUDED.rating, \
                 is_opening                = EXCLUDED.is_opening, \
                 is_opening_24h            = EXCLUDED.is_opening_24h, \
                 minutes_until_next_status = EXCLUDED.minutes_until_next_status, \
                 is_active                 = EXCLUDED.is_active, \
                 is_closed                 = EXCLUDED.is_closed, \
                 operating_time_count      = EXCLUDED.operating_time_count, \
                 promotion_count           = EXCLUDED.promotion_count, \
                 last_seen_run_id          = EXCLUDED.last_seen_run_id, \
                 updated_at                = NOW() \
             RETURNING (xmax = 0) AS is_new",
        ),
        eatery,
        last_seen_run_id,
    )
    .fetch_one(pool)
    .await?;

    Ok(row.try_get::<bool, _>("is_new")?)
}

/// Total number of stored eateries.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_eateries(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM eateries")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
