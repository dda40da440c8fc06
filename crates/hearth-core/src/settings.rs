//! Run settings loaded once at startup from a JSON file.

use crate::{HearthError, Result, SeedPage, SourcePlatform};
use serde::Deserialize;
use std::path::Path;

fn default_timeout() -> u64 {
    30
}

fn default_sleep_range() -> (f64, f64) {
    (1.2, 2.8)
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_timeout")]
    pub request_timeout_sec: u64,
    /// (min, max) seconds slept between consecutive requests.
    #[serde(default = "default_sleep_range")]
    pub sleep_range_sec: (f64, f64),
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            request_timeout_sec: default_timeout(),
            sleep_range_sec: default_sleep_range(),
            user_agent: default_user_agent(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub zips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTemplates {
    /// URL template with a `{ZIP}` placeholder.
    pub zip_search: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Seeds {
    pub redfin: SeedTemplates,
    pub zillow: SeedTemplates,
    /// Optional hardcoded detail URLs to include in every batch.
    #[serde(default)]
    pub detail_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub run: RunSettings,
    pub areas: Vec<Area>,
    pub seeds: Seeds,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HearthError::Settings(format!(
                "config not found at {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        if settings.areas.iter().all(|area| area.zips.is_empty()) {
            return Err(HearthError::Settings(
                "no ZIP codes configured in areas".to_string(),
            ));
        }
        Ok(settings)
    }

    /// One search page per platform per configured ZIP code.
    pub fn search_seeds(&self) -> Vec<SeedPage> {
        let mut pages = Vec::new();
        for area in &self.areas {
            for zip in &area.zips {
                pages.push(SeedPage {
                    platform_id: SourcePlatform::Redfin,
                    zip: Some(zip.clone()),
                    url: self.seeds.redfin.zip_search.replace("{ZIP}", zip),
                });
                pages.push(SeedPage {
                    platform_id: SourcePlatform::Zillow,
                    zip: Some(zip.clone()),
                    url: self.seeds.zillow.zip_search.replace("{ZIP}", zip),
                });
            }
        }
        pages
    }

    pub fn zip_count(&self) -> usize {
        self.areas.iter().map(|area| area.zips.len()).sum()
    }
}

/// Polite default headers for GET requests.
pub fn default_headers(user_agent: &str) -> Vec<(&'static str, String)> {
    vec![
        ("User-Agent", user_agent.to_string()),
        ("Accept-Language", "en-US,en;q=0.9".to_string()),
        ("Cache-Control", "no-cache".to_string()),
        ("Pragma", "no-cache".to_string()),
        ("DNT", "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "run": {
            "request_timeout_sec": 20,
            "sleep_range_sec": [0.5, 1.0],
            "user_agent": "hearth-test"
        },
        "areas": [
            {"city": "Springfield", "state": "IL", "zips": ["62704", "62711"]}
        ],
        "seeds": {
            "redfin": {"zip_search": "https://www.redfin.com/zipcode/{ZIP}"},
            "zillow": {"zip_search": "https://www.zillow.com/homes/{ZIP}_rb/"}
        }
    }"#;

    #[test]
    fn test_load_and_derive_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.run.request_timeout_sec, 20);
        assert_eq!(settings.run.max_retries, 2); // defaulted
        assert_eq!(settings.zip_count(), 2);

        let seeds = settings.search_seeds();
        assert_eq!(seeds.len(), 4); // 2 platforms x 2 zips
        assert!(seeds
            .iter()
            .any(|s| s.url == "https://www.redfin.com/zipcode/62704"));
        assert!(seeds
            .iter()
            .any(|s| s.url == "https://www.zillow.com/homes/62711_rb/"));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let err = Settings::load("/nonexistent/listings.json").unwrap_err();
        assert!(err.to_string().contains("config not found"));
    }

    #[test]
    fn test_default_headers_carry_user_agent() {
        let headers = default_headers("hearth-test");
        assert!(headers
            .iter()
            .any(|(name, value)| *name == "User-Agent" && value == "hearth-test"));
    }
}
