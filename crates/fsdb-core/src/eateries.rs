use serde::{Deserialize, Serialize};

/// An eatery listing mapped onto the canonical persisted schema.
///
/// Every field except `external_id` is overwritten on each sighting; there
/// is no merge with previously stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEatery {
    /// Remote listing id, stored as a string. Natural key for upserts.
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
    /// Minutes until the open/closed status flips, as reported at crawl time.
    pub minutes_until_next_status: Option<i32>,
    pub is_active: bool,
    pub is_closed: bool,
    /// Number of weekly operating-time windows in the listing.
    pub operating_time_count: i32,
    /// Number of promotions attached to the listing at crawl time.
    pub promotion_count: i32,
}

impl NormalizedEatery {
    /// Returns `true` when both coordinates are present.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
