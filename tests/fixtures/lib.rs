//! Shared fixtures for the integration tests: canned detail pages for
//! both platforms and helpers to lay them out as an on-disk batch.

use chrono::{TimeZone, Utc};
use hearth_core::{BatchStore, FetchSnapshot, PageMeta, SeedKind, SourcePlatform};

/// A Redfin-shaped detail page with the given embedded values.
pub fn redfin_detail_page(external_id: u64, price: u64, beds: u32, baths: f64, sqft: u32) -> String {
    format!(
        r#"<html><head>
        <script id="__NEXT_DATA__" type="application/json">
        {{"props": {{"homeData": {{
            "propertyId": {external_id},
            "streetLine": "10 Main St", "city": "Springfield",
            "state": "IL", "zip": "62704",
            "price": {price}, "beds": {beds}, "baths": {baths},
            "squareFeet": {sqft}, "yearBuilt": 1998,
            "photos": [{{"url": "https://img.test/1.jpg"}},
                       {{"url": "https://img.test/2.jpg"}}]
        }}}}}}
        </script></head><body>Welcome home.</body></html>"#
    )
}

/// A page with no platform payloads but valid schema.org markup.
pub fn schema_org_only_page() -> String {
    r#"<html><head>
    <script type="application/ld+json">
    {"@context": "https://schema.org",
     "@type": "SingleFamilyResidence",
     "address": {"streetAddress": "22 Oak Ave", "addressLocality": "Springfield",
                 "addressRegion": "IL", "postalCode": "62704"},
     "floorSize": {"value": 1500},
     "offers": {"@type": "Offer", "price": "$300,000"}}
    </script></head><body>A lovely craftsman.</body></html>"#
        .to_string()
}

/// A page whose only usable signal is visible text.
pub fn text_only_page() -> String {
    r#"<html><body>
    <h1>Open house Sunday</h1>
    <p>3 beds, 2 baths, 1,200 sqft, Year Built: 1998</p>
    </body></html>"#
        .to_string()
}

pub fn detail_meta(idx: u32, url: &str, platform: SourcePlatform) -> PageMeta {
    PageMeta {
        requested_url: url.to_string(),
        final_url: url.to_string(),
        status: 200,
        // fixed timestamp: records must be reproducible byte-for-byte
        fetched_at: Utc.with_ymd_and_hms(2025, 6, 14, 8, 30, 0).unwrap(),
        platform_id: platform,
        seed_kind: SeedKind::Detail,
        idx,
    }
}

/// Write one detail page into the batch the way the fetch layer would.
pub fn write_detail_page(
    store: &BatchStore,
    idx: u32,
    url: &str,
    platform: SourcePlatform,
    html: &str,
) {
    let meta = detail_meta(idx, url, platform);
    let snapshot = FetchSnapshot {
        status: 200,
        final_url: url.to_string(),
        headers: Default::default(),
    };
    store.write_page(&meta, html, &snapshot).unwrap();
}
