//! Identifier stability across pages and the deliberate URL-fallback
//! degradation.

use hearth_core::{BatchStore, SourcePlatform};
use hearth_integration_tests::{text_only_page, write_detail_page};
use hearth_scrapers::{parse_saved_details, DetailParser, ExtractConfig};
use tempfile::tempdir;

fn parser() -> DetailParser {
    DetailParser::new(&ExtractConfig::default()).unwrap()
}

fn zillow_page_with_zpid(zpid: u64) -> String {
    format!(
        r#"<html><head>
        <script data-zrr-shared-data-key="store"><!--
            {{"property": {{"zpid": {zpid}, "price": 300000, "bedrooms": 3,
              "bathrooms": 2, "livingArea": 1500}}}}
        --></script></head><body></body></html>"#
    )
}

#[test]
fn test_same_external_id_same_listing_id_across_urls() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    // the same listing saved twice at different resolved URLs
    write_detail_page(
        &store,
        1001,
        "https://www.zillow.com/homedetails/22-Oak-Ave/44622_zpid/",
        SourcePlatform::Zillow,
        &zillow_page_with_zpid(44622),
    );
    write_detail_page(
        &store,
        1002,
        "https://www.zillow.com/homedetails/22-Oak-Ave/44622_zpid/?utm_source=share",
        SourcePlatform::Zillow,
        &zillow_page_with_zpid(44622),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.external_id.as_deref(), Some("44622"));
    assert_eq!(results[0].record.listing_id, results[1].record.listing_id);
    assert_eq!(results[0].record.property_id, results[1].record.property_id);
}

#[test]
fn test_url_fallback_ids_diverge_without_external_id() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    // no external id recoverable from either page; identifiers fall back
    // to the source URL, so the same logical listing at two URLs splits.
    // This degradation is intentional.
    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/Springfield/home-one",
        SourcePlatform::Redfin,
        &text_only_page(),
    );
    write_detail_page(
        &store,
        1002,
        "https://www.redfin.com/IL/Springfield/home-one?ref=email",
        SourcePlatform::Redfin,
        &text_only_page(),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.external_id, None);
    assert_ne!(results[0].record.listing_id, results[1].record.listing_id);
}
