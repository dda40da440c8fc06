//! Source-agnostic fallback over schema.org JSON-LD blocks.
//!
//! When neither platform extractor finds signal, pages often still carry
//! standardized listing metadata for search engines. The vocabulary here
//! is schema.org's, distinct from either platform's internal key names.

use crate::walk::{value_to_area, value_to_quantity, visit_objects};
use crate::{parse_selector, DetailExtractor};
use hearth_core::{PartialRecord, Result, SourcePlatform};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

/// `@type` markers that identify a residential listing or its offer.
const LISTING_TYPE_MARKERS: &[&str] = &[
    "residence",
    "singlefamily",
    "house",
    "apartment",
    "offer",
    "realestatelisting",
];

#[derive(Debug)]
pub struct SchemaOrgExtractor {
    ld_json: Selector,
}

impl SchemaOrgExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ld_json: parse_selector(r#"script[type="application/ld+json"]"#)?,
        })
    }

    fn is_listing_type(map: &Map<String, Value>) -> bool {
        let type_value = map.get("@type").or_else(|| map.get("type"));
        let type_text = match type_value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(","),
            _ => return false,
        };
        let type_text = type_text.to_lowercase();
        LISTING_TYPE_MARKERS
            .iter()
            .any(|marker| type_text.contains(marker))
    }

    fn harvest(map: &Map<String, Value>, out: &mut PartialRecord) {
        if out.list_price.is_none() {
            if let Some(Value::Object(offer)) = map.get("offers") {
                for key in ["price", "lowPrice", "highPrice"] {
                    if let Some(price) = offer.get(key).and_then(value_to_quantity) {
                        out.list_price = Some(price);
                        break;
                    }
                }
            }
        }

        if let Some(Value::Object(addr)) = map.get("address") {
            let text = |key: &str| {
                addr.get(key)
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            if out.address.street.is_none() {
                out.address.street = text("streetAddress");
            }
            if out.address.city.is_none() {
                out.address.city = text("addressLocality");
            }
            if out.address.region.is_none() {
                out.address.region = text("addressRegion");
            }
            if out.address.postal_code.is_none() {
                out.address.postal_code = text("postalCode");
            }
        }

        if out.bedroom_count.is_none() {
            for key in ["numberOfRooms", "bedrooms"] {
                if let Some(beds) = map.get(key).and_then(value_to_quantity) {
                    out.bedroom_count = Some(beds);
                    break;
                }
            }
        }
        if out.bathroom_count.is_none() {
            for key in ["bathroomCount", "bathrooms"] {
                if let Some(baths) = map.get(key).and_then(value_to_quantity) {
                    out.bathroom_count = Some(baths);
                    break;
                }
            }
        }
        if out.interior_area.is_none() {
            if let Some(Value::Object(floor_size)) = map.get("floorSize") {
                out.interior_area = floor_size.get("value").and_then(value_to_area);
            }
        }

        match map.get("image") {
            Some(Value::Array(images)) => {
                for image in images {
                    if let Some(url) = image.as_str() {
                        out.push_photo(url);
                    }
                }
            }
            Some(Value::String(url)) => out.push_photo(url.clone()),
            _ => {}
        }
    }
}

impl DetailExtractor for SchemaOrgExtractor {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::Unknown
    }

    fn extract(&self, dom: &Html, _raw_text: &str) -> PartialRecord {
        let mut out = PartialRecord::new(SourcePlatform::Unknown);

        for script in dom.select(&self.ld_json) {
            let text = script.text().collect::<String>();
            let text = text
                .trim()
                .trim_start_matches("<![CDATA[")
                .trim_end_matches("]]>")
                .trim();
            let data: Value = match serde_json::from_str(text) {
                Ok(data) => data,
                Err(err) => {
                    debug!("skipping unparseable ld+json block: {}", err);
                    continue;
                }
            };
            visit_objects(&data, &mut |map| {
                if Self::is_listing_type(map) {
                    Self::harvest(map, &mut out);
                }
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PartialRecord {
        let dom = Html::parse_document(html);
        SchemaOrgExtractor::new().unwrap().extract(&dom, html)
    }

    #[test]
    fn test_extracts_residence_block() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@context": "https://schema.org",
             "@type": "SingleFamilyResidence",
             "address": {"streetAddress": "10 Main St",
                         "addressLocality": "Springfield",
                         "addressRegion": "IL", "postalCode": "62704"},
             "numberOfRooms": 3, "bathroomCount": 2,
             "floorSize": {"@type": "QuantitativeValue", "value": 1500},
             "image": ["https://img.test/1.jpg", "https://img.test/1.jpg"],
             "offers": {"@type": "Offer", "price": "$300,000"}}
            </script>
            </head><body></body></html>"#;
        let out = extract(html);

        assert_eq!(out.list_price, Some(300_000.0));
        assert_eq!(out.address.street.as_deref(), Some("10 Main St"));
        assert_eq!(out.address.city.as_deref(), Some("Springfield"));
        assert_eq!(out.bedroom_count, Some(3.0));
        assert_eq!(out.bathroom_count, Some(2.0));
        assert_eq!(out.interior_area, Some(1500));
        assert_eq!(out.photo_urls, vec!["https://img.test/1.jpg"]);
    }

    #[test]
    fn test_non_listing_types_ignored() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type": "BreadcrumbList", "numberOfRooms": 12}
            </script>
            </head><body></body></html>"#;
        let out = extract(html);
        assert_eq!(out.bedroom_count, None);
    }

    #[test]
    fn test_type_array_matches() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type": ["Product", "Apartment"], "bedrooms": 2}
            </script>
            </head><body></body></html>"#;
        let out = extract(html);
        assert_eq!(out.bedroom_count, Some(2.0));
    }

    #[test]
    fn test_malformed_block_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{broken</script>
            <script type="application/ld+json">
            {"@type": "Offer", "offers": {"price": 100}}
            </script>
            </head><body></body></html>"#;
        let out = extract(html);
        assert_eq!(out.list_price, Some(100.0));
    }

    #[test]
    fn test_nested_graph_blocks() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@graph": [
                {"@type": "WebPage", "name": "listing"},
                {"@type": "House",
                 "offers": {"lowPrice": 250000},
                 "floorSize": {"value": "1,100"}}
            ]}
            </script>
            </head><body></body></html>"#;
        let out = extract(html);
        assert_eq!(out.list_price, Some(250_000.0));
        assert_eq!(out.interior_area, Some(1100));
    }
}
