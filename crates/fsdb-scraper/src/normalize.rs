//! Mapping from the wire [`Eatery`] to [`fsdb_core::NormalizedEatery`].
//!
//! The mapping is total: every decoded listing produces a normalized row.
//! Operating-time windows and promotions are not persisted as entities; only
//! their counts survive.

use fsdb_core::NormalizedEatery;

use crate::types::Eatery;

/// Normalizes a decoded listing into the persisted field set.
#[must_use]
pub fn normalize_eatery(eatery: Eatery) -> NormalizedEatery {
    let address = eatery.address.unwrap_or_default();
    let status = eatery.operating_status.unwrap_or_default();

    NormalizedEatery {
        external_id: eatery.id.to_string(),
        name: non_empty(eatery.name),
        avatar_url: non_empty(eatery.avatar),
        phone: non_empty(eatery.phone),
        slug: non_empty(eatery.slug),
        street: non_empty(address.street),
        district: non_empty(address.district),
        city: non_empty(address.city),
        full_address: non_empty(address.full),
        latitude: eatery.lat,
        longitude: eatery.long,
        rating: eatery.rating,
        is_opening: status.is_opening,
        is_opening_24h: status.is_opening_24h,
        minutes_until_next_status: status
            .minutes_until_next_status
            .and_then(|m| i32::try_from(m).ok()),
        is_active: eatery.is_active.unwrap_or(true),
        is_closed: eatery.closed.unwrap_or(false),
        operating_time_count: count(eatery.operating_time.len()),
        promotion_count: count(eatery.promotions.len()),
    }
}

/// Treats empty and whitespace-only strings as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}
