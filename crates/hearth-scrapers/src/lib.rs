pub mod config;
mod fetch;
mod harvest;
mod redfin;
mod schema_org;
mod text_scan;
mod value;
mod walk;
mod zillow;

pub use config::{ExtractConfig, PlatformAliases};
pub use fetch::{balanced_mix, FetchOutcome, PageFetcher};
pub use harvest::LinkHarvester;
pub use redfin::RedfinExtractor;
pub use schema_org::SchemaOrgExtractor;
pub use text_scan::TextScanner;
pub use value::{parse_int, parse_number};
pub use zillow::ZillowExtractor;

use hearth_core::{
    build_record, BatchStore, CanonicalRecord, HearthError, PartialRecord, RawPage, Result,
    SourcePlatform,
};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HearthError::Scraping(e.to_string()))
}

/// One extraction strategy over a parsed detail page.
///
/// Extraction is total: a page whose embedded data is absent or malformed
/// yields a record with only the platform tag set, never an error.
pub trait DetailExtractor {
    fn platform(&self) -> SourcePlatform;
    fn extract(&self, dom: &Html, raw_text: &str) -> PartialRecord;
}

/// The detail-page pipeline: classify the page's platform, run the
/// matching structured extractor, then fall back through progressively
/// weaker strategies while signal is missing.
///
/// The strategy order encodes a confidence ranking: platform-specific
/// structured data, then generic semantic markup, then free-text
/// patterns. Fallbacks only ever fill fields that are still null.
pub struct DetailParser {
    redfin: RedfinExtractor,
    zillow: ZillowExtractor,
    schema_org: SchemaOrgExtractor,
    text: TextScanner,
    host_patterns: &'static [(SourcePlatform, &'static str)],
}

impl DetailParser {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            redfin: RedfinExtractor::new(config)?,
            zillow: ZillowExtractor::new(config)?,
            schema_org: SchemaOrgExtractor::new()?,
            text: TextScanner::new()?,
            host_patterns: config.host_patterns,
        })
    }

    /// Case-insensitive substring match of the resolved URL against the
    /// configured platform hosts.
    pub fn classify(&self, url: &str) -> SourcePlatform {
        let url = url.to_lowercase();
        self.host_patterns
            .iter()
            .find(|(_, host)| url.contains(host))
            .map(|(platform, _)| *platform)
            .unwrap_or(SourcePlatform::Unknown)
    }

    pub fn parse(&self, page: &RawPage) -> PartialRecord {
        self.parse_document(&page.html, page.meta.source_url())
    }

    pub fn parse_document(&self, html: &str, source_url: &str) -> PartialRecord {
        let dom = Html::parse_document(html);

        let mut record = match self.classify(source_url) {
            SourcePlatform::Redfin => self.redfin.extract(&dom, html),
            SourcePlatform::Zillow => self.zillow.extract(&dom, html),
            SourcePlatform::Unknown => {
                // unrecognized host: try both and keep the richer result,
                // ties to the first evaluated
                debug!(url = source_url, "unknown platform, running both extractors");
                let redfin = self.redfin.extract(&dom, html);
                let zillow = self.zillow.extract(&dom, html);
                if redfin.signal_count() >= zillow.signal_count() {
                    redfin
                } else {
                    zillow
                }
            }
        };

        if record.signal_count() == 0 {
            debug!(url = source_url, "no structured signal, trying semantic markup");
            record.fill_from(&self.schema_org.extract(&dom, html));
        }

        if record.signal_count() < 4 {
            record.fill_from(&self.text.extract(&dom, html));
        }

        record
    }
}

/// One parsed detail page, with the path its record was written to.
#[derive(Debug)]
pub struct ParsedDetail {
    pub idx: u32,
    pub record: CanonicalRecord,
    pub path: PathBuf,
}

/// Parse up to `limit` saved detail pages of a batch into canonical
/// records. A page that cannot be read is logged and skipped; it never
/// aborts the batch. Records sharing a location are cross-referenced via
/// the batch-local dedup map.
pub fn parse_saved_details(
    store: &BatchStore,
    parser: &DetailParser,
    limit: usize,
) -> Result<Vec<ParsedDetail>> {
    let indices = store.detail_indices()?;
    let mut locations: HashMap<String, Vec<String>> = HashMap::new();
    let mut results = Vec::new();

    for idx in indices.into_iter().take(limit) {
        let page = match store.read_page(idx) {
            Ok(page) => page,
            Err(err) => {
                warn!("page {:04}: {}, skipping", idx, err);
                continue;
            }
        };

        let partial = parser.parse(&page);
        let mut record = build_record(partial, &page.meta, store.batch_id());

        if let Some(location) = record.location_id.clone() {
            let listings = locations.entry(location).or_default();
            let candidates: Vec<String> = listings
                .iter()
                .filter(|id| **id != record.listing_id)
                .cloned()
                .collect();
            if !candidates.is_empty() {
                record.possible_duplicate = true;
                record.duplicate_candidates = candidates;
            }
            if !listings.contains(&record.listing_id) {
                listings.push(record.listing_id.clone());
            }
        }

        let path = store.write_record(idx, &record)?;
        info!("parsed {:04} -> {}", idx, path.display());
        results.push(ParsedDetail { idx, record, path });
    }

    Ok(results)
}
