//! Listing-URL discovery over saved search pages.
//!
//! Collects candidate links from anchors plus Redfin's `__NEXT_DATA__`
//! payload (richer than the rendered anchors), filters them down to
//! detail-page URLs by platform pattern, and dedupes by
//! (platform, external id).

use crate::parse_selector;
use crate::walk::visit_objects;
use hearth_core::{
    BatchStore, HearthError, ListingUrl, ListingUrls, Result, SourcePlatform,
};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

pub struct LinkHarvester {
    anchors: Selector,
    next_data: Selector,
    redfin_detail: Regex,
    zillow_detail: Regex,
}

impl LinkHarvester {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchors: parse_selector("a[href]")?,
            next_data: parse_selector(r#"script#__NEXT_DATA__[type="application/json"]"#)?,
            redfin_detail: Regex::new(r"(?i)^https?://(?:www\.)?redfin\.com/.+/home/(\d+)")
                .map_err(|e| HearthError::Scraping(e.to_string()))?,
            zillow_detail: Regex::new(
                r"(?i)^https?://(?:www\.)?zillow\.com/homedetails/.+?(\d+)_zpid/?",
            )
            .map_err(|e| HearthError::Scraping(e.to_string()))?,
        })
    }

    /// All candidate links on one saved search page. Relative hrefs are
    /// resolved against the platform the page came from, when known.
    pub fn collect_links(&self, html: &str, base_hint: Option<&str>) -> Vec<String> {
        let dom = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();

        for anchor in dom.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() {
                continue;
            }
            let absolute = if href.starts_with('/') {
                match base_for_hint(base_hint) {
                    Some(base) => join_url(base, href),
                    None => href.to_string(),
                }
            } else {
                href.to_string()
            };
            if !links.contains(&absolute) {
                links.push(absolute);
            }
        }

        if let Some(script) = dom.select(&self.next_data).next() {
            let payload = script.text().collect::<String>();
            match serde_json::from_str::<serde_json::Value>(&payload) {
                Ok(data) => visit_objects(&data, &mut |map| {
                    if let Some(url) = map.get("url").and_then(|v| v.as_str()) {
                        let absolute = if url.starts_with('/') {
                            join_url("https://www.redfin.com", url)
                        } else {
                            url.to_string()
                        };
                        if !links.contains(&absolute) {
                            links.push(absolute);
                        }
                    }
                }),
                Err(err) => debug!("unparseable __NEXT_DATA__ on search page: {}", err),
            }
        }

        links
    }

    /// Keep only detail-page URLs, one per (platform, external id).
    pub fn filter_detail_urls(&self, links: &[String]) -> Vec<ListingUrl> {
        let mut seen: HashSet<(SourcePlatform, String)> = HashSet::new();
        let mut rows = Vec::new();

        for link in links {
            let (platform, captures) = if let Some(c) = self.redfin_detail.captures(link) {
                (SourcePlatform::Redfin, c)
            } else if let Some(c) = self.zillow_detail.captures(link) {
                (SourcePlatform::Zillow, c)
            } else {
                continue;
            };
            let external_id = captures[1].to_string();
            if seen.insert((platform, external_id.clone())) {
                rows.push(ListingUrl {
                    platform_id: platform,
                    source_url: link.clone(),
                    external_property_id: external_id,
                });
            }
        }

        rows
    }

    /// Harvest up to `max_files` saved search pages of a batch and persist
    /// `structured/listing_urls.json`.
    pub fn harvest(&self, store: &BatchStore, max_files: usize) -> Result<ListingUrls> {
        let indices = store.search_indices()?;
        if indices.is_empty() {
            return Err(HearthError::Scraping(
                "no saved search pages to harvest; run `hearth fetch-search` first".to_string(),
            ));
        }

        let mut links: Vec<String> = Vec::new();
        for idx in indices.into_iter().take(max_files) {
            match store.read_page(idx) {
                Ok(page) => {
                    let hint = page.meta.source_url().to_string();
                    for link in self.collect_links(&page.html, Some(&hint)) {
                        if !links.contains(&link) {
                            links.push(link);
                        }
                    }
                }
                Err(err) => warn!("search page {:04}: {}, skipping", idx, err),
            }
        }

        let urls = self.filter_detail_urls(&links);
        let doc = ListingUrls {
            count: urls.len(),
            urls,
        };
        store.write_listing_urls(&doc)?;
        info!("harvested {} listing urls", doc.count);
        Ok(doc)
    }
}

fn base_for_hint(hint: Option<&str>) -> Option<&'static str> {
    let hint = hint?;
    if hint.contains("redfin.com") {
        Some("https://www.redfin.com")
    } else if hint.contains("zillow.com") {
        Some("https://www.zillow.com")
    } else {
        None
    }
}

fn join_url(base: &str, path: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(path))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path.to_string())
}
