//! Batch parsing behavior: fallbacks end-to-end, idempotence, per-page
//! failure isolation and the location dedup map.

use hearth_core::{BatchStore, SourcePlatform};
use hearth_integration_tests::{
    redfin_detail_page, schema_org_only_page, text_only_page, write_detail_page,
};
use hearth_scrapers::{parse_saved_details, DetailParser, ExtractConfig};
use tempfile::tempdir;

fn parser() -> DetailParser {
    DetailParser::new(&ExtractConfig::default()).unwrap()
}

#[test]
fn test_semantic_markup_fallback_end_to_end() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    write_detail_page(
        &store,
        1001,
        "https://www.zillow.com/homedetails/22-Oak-Ave/44622_zpid/",
        SourcePlatform::Zillow,
        &schema_org_only_page(),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    let record = &results[0].record;

    assert_eq!(record.source_platform, SourcePlatform::Zillow);
    assert_eq!(record.list_price, Some(300_000.0));
    assert_eq!(record.interior_area, Some(1500));
    assert_eq!(record.price_per_area, Some(200.0));
    assert_eq!(record.address.street.as_deref(), Some("22 Oak Ave"));
}

#[test]
fn test_text_fallback_end_to_end() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/Springfield/home/5",
        SourcePlatform::Redfin,
        &text_only_page(),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    let record = &results[0].record;

    assert_eq!(record.bedroom_count, Some(3.0));
    assert_eq!(record.bathroom_count, Some(2.0));
    assert_eq!(record.interior_area, Some(1200));
    assert_eq!(record.year_built, Some(1998));
    // nothing recoverable for these
    assert_eq!(record.external_id, None);
    assert_eq!(record.location_id, None);
    assert!(record.media.is_empty());
}

#[test]
fn test_reprocessing_is_byte_identical() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/Springfield/home/445566",
        SourcePlatform::Redfin,
        &redfin_detail_page(445566, 450_000, 3, 2.0, 1800),
    );

    let parser = parser();
    parse_saved_details(&store, &parser, 10).unwrap();
    let first = std::fs::read(store.base_dir().join("structured/1001.json")).unwrap();

    parse_saved_details(&store, &parser, 10).unwrap();
    let second = std::fs::read(store.base_dir().join("structured/1001.json")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_missing_page_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/a/home/1",
        SourcePlatform::Redfin,
        &redfin_detail_page(1, 100_000, 2, 1.0, 900),
    );
    // 1002 has an html file but no meta: unreadable, must be skipped
    std::fs::write(
        store.base_dir().join("raw/1002_raw.html"),
        "<html></html>",
    )
    .unwrap();
    write_detail_page(
        &store,
        1003,
        "https://www.redfin.com/IL/b/home/3",
        SourcePlatform::Redfin,
        &redfin_detail_page(3, 200_000, 3, 2.0, 1200),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    let indices: Vec<u32> = results.iter().map(|r| r.idx).collect();
    assert_eq!(indices, vec![1001, 1003]);
}

#[test]
fn test_limit_bounds_the_batch() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    for i in 0..5u32 {
        write_detail_page(
            &store,
            1001 + i,
            &format!("https://www.redfin.com/IL/x/home/{}", i + 1),
            SourcePlatform::Redfin,
            &redfin_detail_page((i + 1) as u64, 100_000, 2, 1.0, 900),
        );
    }

    let results = parse_saved_details(&store, &parser(), 3).unwrap();
    assert_eq!(results.len(), 3);
}

#[test]
fn test_same_location_cross_references_listings() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "b").unwrap();

    // two different external ids, identical embedded address
    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/a/home/1111",
        SourcePlatform::Redfin,
        &redfin_detail_page(1111, 450_000, 3, 2.0, 1800),
    );
    write_detail_page(
        &store,
        1002,
        "https://www.redfin.com/IL/b/home/2222",
        SourcePlatform::Redfin,
        &redfin_detail_page(2222, 460_000, 3, 2.0, 1800),
    );

    let results = parse_saved_details(&store, &parser(), 10).unwrap();
    let (first, second) = (&results[0].record, &results[1].record);

    assert_ne!(first.listing_id, second.listing_id);
    assert_eq!(first.location_id, second.location_id);

    // the first record saw no earlier listing at this location
    assert!(!first.possible_duplicate);
    assert!(first.duplicate_candidates.is_empty());
    // the second one points back at the first
    assert!(second.possible_duplicate);
    assert_eq!(second.duplicate_candidates, vec![first.listing_id.clone()]);
}
