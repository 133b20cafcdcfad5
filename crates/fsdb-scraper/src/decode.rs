//! Page payload decoding with per-listing failure isolation.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::{Eatery, EateriesPage, Pagination, RecordRejection};

/// Envelope with listings left as raw JSON so each one can fail on its own.
#[derive(Deserialize)]
struct RawEateriesPage {
    #[serde(rename = "Data", default)]
    data: Option<Vec<Value>>,
    pagination: Pagination,
}

/// Decodes one page's response body.
///
/// The envelope and its pagination counters must be well formed; listings are
/// then decoded one at a time and any that fail land in
/// [`EateriesPage::rejected`] instead of failing the page.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] if the body is not JSON, `Data` is
/// present but not an array, or `pagination` is missing or malformed.
pub fn decode_page(body: &[u8], page: u32) -> Result<EateriesPage, ScraperError> {
    let raw: RawEateriesPage =
        serde_json::from_slice(body).map_err(|e| ScraperError::Deserialize {
            context: format!("eateries page {page}"),
            source: e,
        })?;

    let items = raw.data.unwrap_or_default();
    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        let external_id = item.get("id").and_then(Value::as_i64);
        match serde_json::from_value::<Eatery>(item) {
            Ok(eatery) => records.push(eatery),
            Err(e) => {
                tracing::warn!(
                    page,
                    index,
                    external_id,
                    error = %e,
                    "skipping listing: decode failed"
                );
                rejected.push(RecordRejection {
                    index,
                    external_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(EateriesPage {
        records,
        rejected,
        pagination: raw.pagination,
    })
}
