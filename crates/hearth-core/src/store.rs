//! Batch folder store.
//!
//! A batch is a directory under `<data>/batches/<batch-id>/` with three
//! subfolders: `raw/` (fetched pages), `structured/` (extracted JSON
//! documents) and `qa/`. Pages are numbered: search pages 0001-0999,
//! detail pages from 1001. Each page owns three files in `raw/`:
//! `NNNN_raw.html`, `NNNN_meta.json` and `NNNN_response.json`.

use crate::{CanonicalRecord, HearthError, PageMeta, RawPage, Result, SourcePlatform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SEEDS_FILE: &str = "seed_search_pages.json";
const LISTING_URLS_FILE: &str = "listing_urls.json";

/// Detail pages start here; everything below is a search page.
pub const FIRST_DETAIL_INDEX: u32 = 1001;

/// One seed search (or detail) page for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPage {
    pub platform_id: SourcePlatform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCounts {
    pub zip_total: usize,
    pub search_pages_total: usize,
    pub detail_pages_total: usize,
}

/// The `structured/seed_search_pages.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPages {
    pub batch_id: String,
    pub generated_at: DateTime<Utc>,
    pub counts: SeedCounts,
    pub search_pages: Vec<SeedPage>,
    pub detail_pages: Vec<SeedPage>,
}

/// One harvested detail-page URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingUrl {
    pub platform_id: SourcePlatform,
    pub source_url: String,
    pub external_property_id: String,
}

/// The `structured/listing_urls.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingUrls {
    pub count: usize,
    pub urls: Vec<ListingUrl>,
}

/// Response snapshot persisted for later inspection, even on non-200.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSnapshot {
    pub status: u16,
    pub final_url: String,
    pub headers: BTreeMap<String, String>,
}

pub struct BatchStore {
    batch_id: String,
    base: PathBuf,
    raw: PathBuf,
    structured: PathBuf,
}

impl BatchStore {
    /// Open a batch by id, creating its folder structure if needed.
    pub fn open(data_root: impl AsRef<Path>, batch_id: &str) -> Result<Self> {
        let base = data_root.as_ref().join("batches").join(batch_id);
        let raw = base.join("raw");
        let structured = base.join("structured");
        for dir in [&raw, &structured, &base.join("qa")] {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            batch_id: batch_id.to_string(),
            base,
            raw,
            structured,
        })
    }

    /// Open the most recently modified batch under the data root.
    pub fn latest(data_root: impl AsRef<Path>) -> Result<Self> {
        let root = data_root.as_ref().join("batches");
        let mut newest: Option<(std::time::SystemTime, String)> = None;
        if root.exists() {
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let modified = entry.metadata()?.modified()?;
                let name = entry.file_name().to_string_lossy().to_string();
                if newest.as_ref().map(|(ts, _)| modified > *ts).unwrap_or(true) {
                    newest = Some((modified, name));
                }
            }
        }
        match newest {
            Some((_, batch_id)) => Self::open(data_root, &batch_id),
            None => Err(HearthError::NoBatches(root.display().to_string())),
        }
    }

    /// Open the named batch, or fall back to the latest one.
    pub fn open_or_latest(data_root: impl AsRef<Path>, batch_id: Option<&str>) -> Result<Self> {
        match batch_id {
            Some(id) => Self::open(data_root, id),
            None => Self::latest(data_root),
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    fn html_path(&self, idx: u32) -> PathBuf {
        self.raw.join(format!("{:04}_raw.html", idx))
    }

    fn meta_path(&self, idx: u32) -> PathBuf {
        self.raw.join(format!("{:04}_meta.json", idx))
    }

    fn response_path(&self, idx: u32) -> PathBuf {
        self.raw.join(format!("{:04}_response.json", idx))
    }

    fn record_path(&self, idx: u32) -> PathBuf {
        self.structured.join(format!("{:04}.json", idx))
    }

    /// Persist one fetched page: raw HTML (even for non-200 responses, so
    /// failures can be inspected later), response snapshot and meta.
    pub fn write_page(&self, meta: &PageMeta, html: &str, snapshot: &FetchSnapshot) -> Result<()> {
        fs::write(self.html_path(meta.idx), html)?;
        fs::write(
            self.response_path(meta.idx),
            serde_json::to_string_pretty(snapshot)?,
        )?;
        fs::write(self.meta_path(meta.idx), serde_json::to_string_pretty(meta)?)?;
        debug!(idx = meta.idx, batch = %self.batch_id, "saved page");
        Ok(())
    }

    pub fn has_page(&self, idx: u32) -> bool {
        self.html_path(idx).exists() && self.meta_path(idx).exists()
    }

    /// Read one saved page. A page with either file missing is a named
    /// per-page failure the batch loop can skip.
    pub fn read_page(&self, idx: u32) -> Result<RawPage> {
        let html_path = self.html_path(idx);
        let meta_path = self.meta_path(idx);
        if !html_path.exists() || !meta_path.exists() {
            return Err(HearthError::MissingPage {
                batch: self.batch_id.clone(),
                index: idx,
            });
        }
        // pages come from the wild; tolerate invalid UTF-8
        let html = String::from_utf8_lossy(&fs::read(html_path)?).into_owned();
        let meta: PageMeta = serde_json::from_str(&fs::read_to_string(meta_path)?)?;
        Ok(RawPage { html, meta })
    }

    pub fn write_record(&self, idx: u32, record: &CanonicalRecord) -> Result<PathBuf> {
        let path = self.record_path(idx);
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        Ok(path)
    }

    /// All structured records in the batch, in index order.
    pub fn read_records(&self) -> Result<Vec<(u32, CanonicalRecord)>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.structured)? {
            let path = entry?.path();
            let idx = match path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok())
            {
                Some(idx) => idx,
                // seeds / listing_urls documents live here too
                None => continue,
            };
            let record: CanonicalRecord = serde_json::from_str(&fs::read_to_string(&path)?)?;
            records.push((idx, record));
        }
        records.sort_by_key(|(idx, _)| *idx);
        Ok(records)
    }

    fn page_indices(&self, detail: bool) -> Result<Vec<u32>> {
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.raw)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            let Some(stem) = name.strip_suffix("_raw.html") else {
                continue;
            };
            let Ok(idx) = stem.parse::<u32>() else {
                continue;
            };
            if (idx >= FIRST_DETAIL_INDEX) == detail {
                indices.push(idx);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Saved search page indices (0001-0999), ascending.
    pub fn search_indices(&self) -> Result<Vec<u32>> {
        self.page_indices(false)
    }

    /// Saved detail page indices (1001+), ascending.
    pub fn detail_indices(&self) -> Result<Vec<u32>> {
        self.page_indices(true)
    }

    pub fn next_search_index(&self) -> Result<u32> {
        Ok(self.search_indices()?.last().map(|idx| idx + 1).unwrap_or(1))
    }

    pub fn next_detail_index(&self) -> Result<u32> {
        Ok(self
            .detail_indices()?
            .last()
            .map(|idx| idx + 1)
            .unwrap_or(FIRST_DETAIL_INDEX))
    }

    pub fn write_seed_pages(&self, seeds: &SeedPages) -> Result<PathBuf> {
        let path = self.structured.join(SEEDS_FILE);
        fs::write(&path, serde_json::to_string_pretty(seeds)?)?;
        Ok(path)
    }

    pub fn read_seed_pages(&self) -> Result<SeedPages> {
        let path = self.structured.join(SEEDS_FILE);
        if !path.exists() {
            return Err(HearthError::Settings(format!(
                "seeds file not found at {}; run `hearth init` first",
                path.display()
            )));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn write_listing_urls(&self, urls: &ListingUrls) -> Result<PathBuf> {
        let path = self.structured.join(LISTING_URLS_FILE);
        fs::write(&path, serde_json::to_string_pretty(urls)?)?;
        Ok(path)
    }

    pub fn read_listing_urls(&self) -> Result<ListingUrls> {
        let path = self.structured.join(LISTING_URLS_FILE);
        if !path.exists() {
            return Err(HearthError::Settings(format!(
                "listing_urls.json not found at {}; run `hearth harvest` first",
                path.display()
            )));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}
