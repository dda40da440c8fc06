//! Immutable extraction configuration.
//!
//! Both platforms embed their internal data model as JSON inside the page,
//! and both have renamed keys over time. Each field therefore maps to a
//! list of historically-observed key aliases, tried in order. The tables
//! are built once at startup and passed into extractor constructors; they
//! are not part of any external contract.

use hearth_core::SourcePlatform;

/// Key alias tables for one platform's embedded JSON.
#[derive(Debug, Clone, Copy)]
pub struct PlatformAliases {
    pub external_id: &'static [&'static str],
    pub street: &'static [&'static str],
    pub unit: &'static [&'static str],
    pub city: &'static [&'static str],
    pub region: &'static [&'static str],
    pub postal_code: &'static [&'static str],
    pub price: &'static [&'static str],
    pub beds: &'static [&'static str],
    pub baths: &'static [&'static str],
    pub area: &'static [&'static str],
    pub year_built: &'static [&'static str],
    pub latitude: &'static [&'static str],
    pub longitude: &'static [&'static str],
    /// Keys whose value holds photos (array of objects, array of strings,
    /// or a bare string).
    pub photos: &'static [&'static str],
    /// Keys that hold the URL inside a photo object.
    pub photo_url_keys: &'static [&'static str],
}

const REDFIN_ALIASES: PlatformAliases = PlatformAliases {
    external_id: &["propertyId", "propertyIdStr", "id"],
    street: &["streetLine"],
    unit: &["unitNumber", "unit"],
    city: &["city"],
    region: &["state", "stateCode"],
    postal_code: &["zip", "postalCode"],
    price: &["price", "listPrice"],
    beds: &["beds"],
    baths: &["baths", "bathsTotal"],
    area: &[
        "squareFeet",
        "sqFt",
        "livingArea",
        "livingAreaSqFt",
        "aboveGradeFinishedArea",
    ],
    year_built: &["yearBuilt"],
    latitude: &["latitude"],
    longitude: &["longitude"],
    photos: &["photos"],
    photo_url_keys: &["url", "href", "src"],
};

const ZILLOW_ALIASES: PlatformAliases = PlatformAliases {
    external_id: &["zpid", "zillowId", "propertyId"],
    street: &["streetAddress"],
    unit: &["unitNumber", "unit"],
    city: &["city"],
    region: &["state"],
    postal_code: &["zipcode", "postalCode"],
    price: &["price", "listPrice", "priceForHDP"],
    beds: &["bedrooms", "beds"],
    baths: &["bathrooms", "baths"],
    area: &[
        "livingArea",
        "livingAreaValue",
        "area",
        "finishedSqFt",
        "finishedArea",
    ],
    year_built: &["yearBuilt"],
    latitude: &["latitude"],
    longitude: &["longitude"],
    photos: &["photos", "media", "photoGallery", "hiResImageLink"],
    photo_url_keys: &["url", "href", "rawUrl", "hiRes"],
};

/// Everything the extraction pipeline needs decided up front: alias
/// tables and the URL substrings that classify a page's platform.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub redfin: PlatformAliases,
    pub zillow: PlatformAliases,
    /// Case-insensitive substrings matched against the resolved URL.
    pub host_patterns: &'static [(SourcePlatform, &'static str)],
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            redfin: REDFIN_ALIASES,
            zillow: ZILLOW_ALIASES,
            host_patterns: &[
                (SourcePlatform::Redfin, "redfin.com"),
                (SourcePlatform::Zillow, "zillow.com"),
            ],
        }
    }
}
