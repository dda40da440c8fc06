//! Zillow detail-page extractor.
//!
//! Zillow scatters its data model across several embedded payloads: the
//! `data-zrr-shared-data-key` script blocks (wrapped in HTML comment
//! markers) and the Apollo preload cache. All payloads are parsed and
//! walked with one alias table; blocks that fail to parse are skipped.

use crate::config::ExtractConfig;
use crate::value::parse_int;
use crate::walk::{apply_aliases, visit_objects};
use crate::{parse_selector, DetailExtractor};
use hearth_core::{HearthError, PartialRecord, Result, SourcePlatform};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

#[derive(Debug)]
pub struct ZillowExtractor {
    aliases: crate::config::PlatformAliases,
    shared_data: Selector,
    apollo: Selector,
    area_rx: Regex,
}

impl ZillowExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            aliases: config.zillow,
            shared_data: parse_selector("script[data-zrr-shared-data-key]")?,
            apollo: parse_selector(r#"script#hdpApolloPreloadedData[type="application/json"]"#)?,
            area_rx: Regex::new(r"(?i)([\d,\.]+)\s*(?:sq\s*ft|sqft)")
                .map_err(|e| HearthError::Scraping(e.to_string()))?,
        })
    }

    fn payloads(&self, dom: &Html) -> Vec<serde_json::Value> {
        let mut payloads = Vec::new();

        for script in dom.select(&self.shared_data) {
            let text = script
                .text()
                .collect::<String>()
                .replace("<!--", "")
                .replace("-->", "");
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str(text) {
                Ok(value) => payloads.push(value),
                Err(err) => debug!("skipping unparseable shared-data block: {}", err),
            }
        }

        if let Some(script) = dom.select(&self.apollo).next() {
            let text = script.text().collect::<String>();
            match serde_json::from_str(text.trim()) {
                Ok(value) => payloads.push(value),
                Err(err) => debug!("skipping unparseable apollo payload: {}", err),
            }
        }

        payloads
    }
}

impl DetailExtractor for ZillowExtractor {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::Zillow
    }

    fn extract(&self, dom: &Html, raw_text: &str) -> PartialRecord {
        let mut out = PartialRecord::new(SourcePlatform::Zillow);

        for payload in self.payloads(dom) {
            visit_objects(&payload, &mut |map| {
                apply_aliases(map, &self.aliases, &mut out)
            });
        }

        if out.interior_area.is_none() {
            if let Some(captures) = self.area_rx.captures(raw_text) {
                out.interior_area = parse_int(&captures[1]);
            }
        }

        out
    }
}
