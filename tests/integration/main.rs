use hearth_core::{BatchStore, SourcePlatform};
use hearth_integration_tests::{redfin_detail_page, write_detail_page};
use hearth_scrapers::{parse_saved_details, DetailParser, ExtractConfig};
use tempfile::tempdir;

mod identifiers;
mod parse;

#[test]
fn test_full_pipeline_over_a_batch() {
    let dir = tempdir().unwrap();
    let store = BatchStore::open(dir.path(), "2025-06-14_zips2").unwrap();

    write_detail_page(
        &store,
        1001,
        "https://www.redfin.com/IL/Springfield/10-Main-St/home/445566",
        SourcePlatform::Redfin,
        &redfin_detail_page(445566, 450_000, 3, 2.0, 1800),
    );

    let parser = DetailParser::new(&ExtractConfig::default()).unwrap();
    let results = parse_saved_details(&store, &parser, 10).unwrap();
    assert_eq!(results.len(), 1);

    let record = &results[0].record;
    assert_eq!(record.source_platform, SourcePlatform::Redfin);
    assert_eq!(record.external_id.as_deref(), Some("445566"));
    assert_eq!(record.batch_id, "2025-06-14_zips2");
    assert_eq!(record.list_price, Some(450_000.0));
    assert_eq!(record.interior_area, Some(1800));
    assert_eq!(record.price_per_area, Some(250.0));
    assert_eq!(record.year_built, Some(1998));
    assert_eq!(record.address.street.as_deref(), Some("10 Main St"));
    assert_eq!(record.media.len(), 2);
    assert!(record.media[0].is_primary);
    assert!(record.location_id.is_some());

    // the record document landed in structured/ and round-trips
    let on_disk = store.read_records().unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].0, 1001);
    assert_eq!(on_disk[0].1.listing_id, record.listing_id);
}
