//! Canonical record assembly.

use crate::{ids, CanonicalRecord, MediaItem, PageMeta, PartialRecord, MAX_PHOTOS};

/// Build the final record for one parsed page. Pure: everything derives
/// from the merged extraction result, the page's fetch metadata and the
/// batch identifier, so re-processing a page reproduces the record
/// byte-for-byte.
pub fn build_record(merged: PartialRecord, meta: &PageMeta, batch_id: &str) -> CanonicalRecord {
    let source_url = meta.source_url().to_lowercase();

    let listing_id = ids::listing_id(
        merged.source_platform,
        merged.external_id.as_deref(),
        &source_url,
    );
    let location_id = ids::location_id(&merged.address, merged.latitude, merged.longitude);

    let price_per_area = match (merged.list_price, merged.interior_area) {
        (Some(price), Some(area)) if price > 0.0 && area > 0 => {
            Some((price / area as f64 * 100.0).round() / 100.0)
        }
        _ => None,
    };

    let media = merged
        .photo_urls
        .iter()
        .take(MAX_PHOTOS)
        .enumerate()
        .map(|(order, url)| MediaItem {
            url: url.clone(),
            display_order: order as u32,
            is_primary: order == 0,
        })
        .collect();

    CanonicalRecord {
        property_id: listing_id.clone(),
        listing_id,
        source_platform: merged.source_platform,
        source_url,
        external_id: merged.external_id,
        batch_id: batch_id.to_string(),
        fetched_at: meta.fetched_at,
        address: merged.address,
        latitude: merged.latitude,
        longitude: merged.longitude,
        location_id,
        list_price: merged.list_price,
        bedroom_count: merged.bedroom_count,
        bathroom_count: merged.bathroom_count,
        interior_area: merged.interior_area,
        year_built: merged.year_built,
        price_per_area,
        media,
        possible_duplicate: false,
        duplicate_candidates: Vec::new(),
    }
}
