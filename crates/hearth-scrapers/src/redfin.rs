//! Redfin detail-page extractor.
//!
//! Redfin ships its data model as one JSON payload inside
//! `script#__NEXT_DATA__`. The payload's internal layout drifts between
//! page generations, so fields are recovered by walking the whole tree
//! with the alias table rather than by path.

use crate::config::ExtractConfig;
use crate::value::{parse_int, parse_number};
use crate::walk::{apply_aliases, visit_objects};
use crate::{parse_selector, DetailExtractor};
use hearth_core::{HearthError, PartialRecord, Result, SourcePlatform};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

#[derive(Debug)]
pub struct RedfinExtractor {
    aliases: crate::config::PlatformAliases,
    next_data: Selector,
    area_rx: Regex,
    price_rx: Regex,
}

impl RedfinExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            aliases: config.redfin,
            next_data: parse_selector(r#"script#__NEXT_DATA__[type="application/json"]"#)?,
            area_rx: Regex::new(r"(?i)([\d,\.]+)\s*(?:sq\s*ft|sqft)")
                .map_err(|e| HearthError::Scraping(e.to_string()))?,
            price_rx: Regex::new(r"(?i)price[:\s]*\$?\s*([\d,\.]+)")
                .map_err(|e| HearthError::Scraping(e.to_string()))?,
        })
    }
}

impl DetailExtractor for RedfinExtractor {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::Redfin
    }

    fn extract(&self, dom: &Html, raw_text: &str) -> PartialRecord {
        let mut out = PartialRecord::new(SourcePlatform::Redfin);

        if let Some(script) = dom.select(&self.next_data).next() {
            let payload = script.text().collect::<String>();
            match serde_json::from_str::<serde_json::Value>(&payload) {
                Ok(data) => {
                    visit_objects(&data, &mut |map| apply_aliases(map, &self.aliases, &mut out));
                }
                // malformed block: skip it, keep whatever else the page offers
                Err(err) => debug!("unparseable __NEXT_DATA__ payload: {}", err),
            }
        }

        // bounded text recovery when the structured walk found neither
        if out.interior_area.is_none() {
            if let Some(captures) = self.area_rx.captures(raw_text) {
                out.interior_area = parse_int(&captures[1]);
            }
        }
        if out.list_price.is_none() {
            if let Some(captures) = self.price_rx.captures(raw_text) {
                out.list_price = parse_number(&captures[1]);
            }
        }

        out
    }
}
