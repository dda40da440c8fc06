//! Polite page fetching.
//!
//! Fetches one URL at a time with configured headers and timeout, retries
//! on 429/5xx and network errors with exponential backoff plus jitter,
//! and persists raw HTML (even for non-200 responses), a response
//! snapshot, and the minimal fetch metadata.

use chrono::Utc;
use hearth_core::{
    default_headers, BatchStore, FetchSnapshot, HearthError, PageMeta, Result, RunSettings,
    SeedKind, SeedPage, SourcePlatform,
};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct FetchOutcome {
    pub idx: u32,
    pub status: u16,
    pub final_url: String,
}

pub struct PageFetcher {
    client: Client,
    settings: RunSettings,
}

impl PageFetcher {
    pub fn new(settings: &RunSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in default_headers(&settings.user_agent) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HearthError::Scraping(e.to_string()))?;
            let value =
                HeaderValue::from_str(&value).map_err(|e| HearthError::Scraping(e.to_string()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout_sec))
            .build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    pub fn infer_platform(url: &str) -> SourcePlatform {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        if host.contains("zillow.com") {
            SourcePlatform::Zillow
        } else if host.contains("redfin.com") {
            SourcePlatform::Redfin
        } else {
            SourcePlatform::Unknown
        }
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn backoff(attempt: u32) {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..0.5);
        let secs = 1.5_f64.powi(attempt as i32) + jitter;
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    /// Sleep a randomized interval between consecutive requests.
    pub async fn polite_sleep(&self) {
        let (lo, hi) = self.settings.sleep_range_sec;
        let secs = if hi > lo {
            rand::thread_rng().gen_range(lo..hi)
        } else {
            lo
        };
        tokio::time::sleep(Duration::from_secs_f64(secs.max(0.0))).await;
    }

    /// GET one URL and persist its raw HTML, response snapshot and meta
    /// under `idx` in the batch.
    pub async fn fetch_and_save(
        &self,
        store: &BatchStore,
        idx: u32,
        url: &str,
        seed_kind: SeedKind,
    ) -> Result<FetchOutcome> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok((status, final_url, headers, body)) => {
                    if Self::should_retry(status) && attempt < self.settings.max_retries {
                        warn!(status = status.as_u16(), url, "retryable response, backing off");
                        Self::backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    let platform_id = Self::infer_platform(if final_url.is_empty() {
                        url
                    } else {
                        &final_url
                    });
                    let meta = PageMeta {
                        requested_url: url.to_string(),
                        final_url: final_url.clone(),
                        status: status.as_u16(),
                        fetched_at: Utc::now(),
                        platform_id,
                        seed_kind,
                        idx,
                    };
                    let snapshot = FetchSnapshot {
                        status: status.as_u16(),
                        final_url: final_url.clone(),
                        headers,
                    };
                    store.write_page(&meta, &body, &snapshot)?;

                    info!(idx, status = status.as_u16(), url, "fetched");
                    return Ok(FetchOutcome {
                        idx,
                        status: status.as_u16(),
                        final_url,
                    });
                }
                Err(err) => {
                    if attempt < self.settings.max_retries {
                        warn!(url, "fetch failed ({}), backing off", err);
                        Self::backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
    ) -> Result<(StatusCode, String, BTreeMap<String, String>, String)> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let body = response.text().await?;
        Ok((status, final_url, headers, body))
    }
}

/// An approximately 50/50 platform mix of seed pages, up to `limit`.
/// Falls back to whatever is available when one side runs short.
pub fn balanced_mix(pages: &[SeedPage], limit: usize) -> Vec<SeedPage> {
    use rand::seq::SliceRandom;

    if limit == 0 {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let mut zillow: Vec<SeedPage> = pages
        .iter()
        .filter(|p| p.platform_id == SourcePlatform::Zillow)
        .cloned()
        .collect();
    let mut redfin: Vec<SeedPage> = pages
        .iter()
        .filter(|p| p.platform_id == SourcePlatform::Redfin)
        .cloned()
        .collect();
    let mut other: Vec<SeedPage> = pages
        .iter()
        .filter(|p| p.platform_id == SourcePlatform::Unknown)
        .cloned()
        .collect();
    zillow.shuffle(&mut rng);
    redfin.shuffle(&mut rng);
    other.shuffle(&mut rng);

    let take_z = zillow.len().min((limit / 2).max(1));
    let take_r = redfin.len().min(limit - take_z);

    let mut mixed = Vec::new();
    'interleave: for i in 0..take_z.max(take_r) {
        if i < take_z {
            mixed.push(zillow[i].clone());
            if mixed.len() >= limit {
                break 'interleave;
            }
        }
        if i < take_r {
            mixed.push(redfin[i].clone());
            if mixed.len() >= limit {
                break 'interleave;
            }
        }
    }

    if mixed.len() < limit {
        let leftovers = other
            .drain(..)
            .chain(zillow.drain(..).skip(take_z))
            .chain(redfin.drain(..).skip(take_r));
        let missing = limit - mixed.len();
        mixed.extend(leftovers.take(missing));
    }

    mixed.truncate(limit);
    mixed
}
