//! Last-resort pattern scan over raw page text.
//!
//! A safety net for pages whose markup defeated every structured
//! strategy: five independent regex scans, each filling one field or
//! leaving it null. Never inspects structure.

use crate::value::{parse_int, parse_number, plausible_year};
use crate::DetailExtractor;
use hearth_core::{HearthError, PartialRecord, Result, SourcePlatform};
use regex::Regex;
use scraper::Html;

#[derive(Debug)]
pub struct TextScanner {
    price_rx: Regex,
    beds_rx: Regex,
    baths_rx: Regex,
    area_rx: Regex,
    year_rx: Regex,
}

impl TextScanner {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| HearthError::Scraping(e.to_string()))
        };
        Ok(Self {
            price_rx: compile(r"\$\s*([\d,]+)")?,
            beds_rx: compile(r"(?i)(\d+(?:\.\d+)?)\s*beds?")?,
            baths_rx: compile(r"(?i)(\d+(?:\.\d+)?)\s*baths?")?,
            area_rx: compile(r"(?i)([\d,\.]+)\s*(?:sq\s*ft|sqft)")?,
            year_rx: compile(r"(?i)year\s*built[:\s]*([12]\d{3})")?,
        })
    }

    pub fn scan(&self, raw_text: &str) -> PartialRecord {
        let mut out = PartialRecord::new(SourcePlatform::Unknown);

        if let Some(captures) = self.price_rx.captures(raw_text) {
            out.list_price = parse_number(&captures[1]);
        }
        if let Some(captures) = self.beds_rx.captures(raw_text) {
            out.bedroom_count = parse_number(&captures[1]);
        }
        if let Some(captures) = self.baths_rx.captures(raw_text) {
            out.bathroom_count = parse_number(&captures[1]);
        }
        if let Some(captures) = self.area_rx.captures(raw_text) {
            out.interior_area = parse_int(&captures[1]);
        }
        if let Some(captures) = self.year_rx.captures(raw_text) {
            out.year_built = captures[1]
                .parse::<i32>()
                .ok()
                .filter(|year| plausible_year(*year));
        }

        out
    }
}

impl DetailExtractor for TextScanner {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::Unknown
    }

    fn extract(&self, _dom: &Html, raw_text: &str) -> PartialRecord {
        self.scan(raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_all_fields_from_plain_text() {
        let text = "Charming ranch: 3 beds, 2 baths, 1,200 sqft, \
                    Year Built: 1998. Offered at $210,000.";
        let out = TextScanner::new().unwrap().scan(text);

        assert_eq!(out.bedroom_count, Some(3.0));
        assert_eq!(out.bathroom_count, Some(2.0));
        assert_eq!(out.interior_area, Some(1200));
        assert_eq!(out.year_built, Some(1998));
        assert_eq!(out.list_price, Some(210_000.0));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "$100,000 reduced from $120,000";
        let out = TextScanner::new().unwrap().scan(text);
        assert_eq!(out.list_price, Some(100_000.0));
    }

    #[test]
    fn test_fractional_baths_and_spaced_units() {
        let text = "2.5 Baths and 1,840 Sq Ft";
        let out = TextScanner::new().unwrap().scan(text);
        assert_eq!(out.bathroom_count, Some(2.5));
        assert_eq!(out.interior_area, Some(1840));
    }

    #[test]
    fn test_absent_fields_stay_null() {
        let out = TextScanner::new().unwrap().scan("No numbers to be found here.");
        assert_eq!(out.signal_count(), 0);
        assert_eq!(out.year_built, None);
    }

    #[test]
    fn test_year_requires_phrase_and_plausible_value() {
        let scanner = TextScanner::new().unwrap();
        // a bare year without the phrase is ignored
        assert_eq!(scanner.scan("built in 1998").year_built, None);
        assert_eq!(scanner.scan("Year built 2004").year_built, Some(2004));
    }
}
