//! Wire types for the Lozi `search/eateries/near-by` endpoint.
//!
//! ## Envelope
//! ```json
//! { "Data": [ { "id": 123, ... } ],
//!   "pagination": { "total": 100, "page": 1, "limit": 24, "nextUrl": "..." } }
//! ```
//! The listing array uses a capitalized `Data` key while every other key is
//! camelCase.
//!
//! ## Strictness
//! - `pagination.total`, `pagination.page` and `pagination.limit` are required
//!   non-negative integers. A page without them is rejected as a whole.
//! - Each listing's `id` is required. Listings are decoded one by one (see
//!   [`crate::decode`]) so a bad listing only drops itself.
//! - Display fields are optional; unknown fields are ignored.
//! - `operatingTime` and `promotions` are decoded leniently: `null`, a
//!   non-array value, or malformed elements never fail the listing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// One page of listings after decoding.
#[derive(Debug)]
pub struct EateriesPage {
    /// Listings that decoded successfully, in payload order.
    pub records: Vec<Eatery>,
    /// Listings that were present in the payload but could not be decoded.
    pub rejected: Vec<RecordRejection>,
    pub pagination: Pagination,
}

/// A listing that failed to decode, kept for logging and run statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRejection {
    /// Zero-based position in the page's `Data` array.
    pub index: usize,
    /// The listing's `id`, when it was readable as an integer.
    pub external_id: Option<i64>,
    pub reason: String,
}

/// Pagination metadata reported with every page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(default, rename = "nextUrl")]
    pub next_url: Option<String>,
}

/// A single eatery listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eatery {
    /// Lozi numeric listing id; the external identifier.
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    /// URL slug, e.g. `"bun-cha-huong-lien"`.
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub address: Option<Address>,

    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub long: Option<f64>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub operating_time: Vec<OperatingTime>,

    #[serde(default)]
    pub operating_status: Option<OperatingStatus>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub promotions: Vec<Promotion>,

    /// Absent on some listings; treated as active when missing.
    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub closed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Pre-formatted single-line address.
    #[serde(default)]
    pub full: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatingTime {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(default)]
    pub weekday: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingStatus {
    #[serde(default)]
    pub is_opening: bool,
    #[serde(default)]
    pub is_opening_24h: bool,
    #[serde(default)]
    pub minutes_until_next_status: Option<i64>,
}

/// Promotion attached to a listing. Only a handful of fields are kept; the
/// rest of the (large) promotion object is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub promotion_type: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub active_from: Option<String>,
    #[serde(default)]
    pub active_to: Option<String>,
}

/// Deserializes a JSON array into `Vec<T>`, dropping elements that do not
/// fit `T`. Any non-array value (including `null`) yields an empty vec.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
