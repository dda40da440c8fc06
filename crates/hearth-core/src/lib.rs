use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

mod display;
mod ids;
mod record;
mod settings;
mod store;

pub use display::{create_record_table, RecordTableRow};
pub use ids::{listing_id, location_id};
pub use record::build_record;
pub use settings::{default_headers, Area, RunSettings, SeedTemplates, Seeds, Settings};
pub use store::{
    BatchStore, FetchSnapshot, ListingUrl, ListingUrls, SeedCounts, SeedPage, SeedPages,
};

pub type Result<T> = std::result::Result<T, HearthError>;

/// Hard cap on photo URLs carried per record.
pub const MAX_PHOTOS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Scraping error: {0}")]
    Scraping(String),
    #[error("Invalid settings: {0}")]
    Settings(String),
    #[error("page {index:04} missing from batch {batch}")]
    MissingPage { batch: String, index: u32 },
    #[error("no batches found under {0}")]
    NoBatches(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourcePlatform {
    Redfin,
    Zillow,
    #[default]
    Unknown,
}

impl std::fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourcePlatform::Redfin => write!(f, "redfin"),
            SourcePlatform::Zillow => write!(f, "zillow"),
            SourcePlatform::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for SourcePlatform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redfin" => Ok(SourcePlatform::Redfin),
            "zillow" => Ok(SourcePlatform::Zillow),
            "unknown" | "" => Ok(SourcePlatform::Unknown),
            _ => Err(format!(
                "Invalid platform: {}. Valid options are: redfin, zillow, unknown",
                s
            )),
        }
    }
}

/// Which kind of seed a fetched page came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Search,
    Detail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.unit.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.postal_code.is_none()
    }

    /// Adopt `other`'s sub-fields where this address still has none.
    /// Aliasing is per-field: a fallback may fill `city` even when
    /// `street` is already known.
    pub fn fill_from(&mut self, other: &Address) {
        if self.street.is_none() {
            self.street = other.street.clone();
        }
        if self.unit.is_none() {
            self.unit = other.unit.clone();
        }
        if self.city.is_none() {
            self.city = other.city.clone();
        }
        if self.region.is_none() {
            self.region = other.region.clone();
        }
        if self.postal_code.is_none() {
            self.postal_code = other.postal_code.clone();
        }
    }
}

/// Best-effort field bag produced by one extraction strategy. Every field
/// is optional; a value an extractor could not parse with confidence stays
/// `None` rather than guessed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialRecord {
    pub source_platform: SourcePlatform,
    pub external_id: Option<String>,
    pub address: Address,
    pub list_price: Option<f64>,
    pub bedroom_count: Option<f64>,
    pub bathroom_count: Option<f64>,
    pub interior_area: Option<i64>,
    pub year_built: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_urls: Vec<String>,
}

impl PartialRecord {
    pub fn new(source_platform: SourcePlatform) -> Self {
        Self {
            source_platform,
            ..Default::default()
        }
    }

    /// Null-only back-fill: adopt `other`'s value for every field this
    /// record has not populated yet. The platform tag is never touched and
    /// populated fields are never replaced, so repeated merges are strictly
    /// monotonic.
    pub fn fill_from(&mut self, other: &PartialRecord) {
        if self.external_id.is_none() {
            self.external_id = other.external_id.clone();
        }
        self.address.fill_from(&other.address);
        if self.list_price.is_none() {
            self.list_price = other.list_price;
        }
        if self.bedroom_count.is_none() {
            self.bedroom_count = other.bedroom_count;
        }
        if self.bathroom_count.is_none() {
            self.bathroom_count = other.bathroom_count;
        }
        if self.interior_area.is_none() {
            self.interior_area = other.interior_area;
        }
        if self.year_built.is_none() {
            self.year_built = other.year_built;
        }
        if self.latitude.is_none() {
            self.latitude = other.latitude;
        }
        if self.longitude.is_none() {
            self.longitude = other.longitude;
        }
        if self.photo_urls.is_empty() {
            self.photo_urls = other.photo_urls.clone();
        }
    }

    /// Append a photo URL, deduplicating by exact string and keeping the
    /// first `MAX_PHOTOS` in encounter order.
    pub fn push_photo(&mut self, url: impl Into<String>) {
        if self.photo_urls.len() >= MAX_PHOTOS {
            return;
        }
        let url = url.into();
        if url.is_empty() || self.photo_urls.iter().any(|u| u == &url) {
            return;
        }
        self.photo_urls.push(url);
    }

    /// How many of the four signal fields (price, beds, baths, area) are
    /// populated. Drives fallback triggering and the unknown-platform
    /// tie-break.
    pub fn signal_count(&self) -> usize {
        [
            self.list_price.is_some(),
            self.bedroom_count.is_some(),
            self.bathroom_count.is_some(),
            self.interior_area.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Minimal fetch metadata persisted next to every raw page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub fetched_at: DateTime<Utc>,
    pub platform_id: SourcePlatform,
    pub seed_kind: SeedKind,
    pub idx: u32,
}

impl PageMeta {
    /// The URL a page should be attributed to: the post-redirect URL when
    /// known, the requested one otherwise.
    pub fn source_url(&self) -> &str {
        if self.final_url.is_empty() {
            &self.requested_url
        } else {
            &self.final_url
        }
    }
}

/// One saved page plus its fetch metadata, immutable once fetched.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub html: String,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub url: String,
    pub display_order: u32,
    pub is_primary: bool,
}

/// Final, self-contained record for one parsed detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub listing_id: String,
    pub property_id: String,
    pub source_platform: SourcePlatform,
    pub source_url: String,
    pub external_id: Option<String>,
    pub batch_id: String,
    pub fetched_at: DateTime<Utc>,
    pub address: Address,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_id: Option<String>,
    pub list_price: Option<f64>,
    pub bedroom_count: Option<f64>,
    pub bathroom_count: Option<f64>,
    pub interior_area: Option<i64>,
    pub year_built: Option<i32>,
    pub price_per_area: Option<f64>,
    pub media: Vec<MediaItem>,
    pub possible_duplicate: bool,
    pub duplicate_candidates: Vec<String>,
}
