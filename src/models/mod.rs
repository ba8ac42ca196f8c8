use serde::{Deserialize, Serialize};

/// Written for any single field the detail page does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// Column order of the output CSV, identical to the field order of [`ListingRecord`]
pub const CSV_HEADER: [&str; 10] = [
    "price_per_week",
    "beds",
    "baths",
    "persons",
    "room_overview",
    "property_features",
    "property_about",
    "flatmates_about",
    "district",
    "source_url",
];

/// One scraped rental listing, one CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub price_per_week: String,
    pub beds: String,
    pub baths: String,
    pub persons: String,
    pub room_overview: String,
    pub property_features: String,
    pub property_about: String,
    pub flatmates_about: String,
    pub district: String,
    pub source_url: String,
}

impl ListingRecord {
    /// A record for `url` with every field set to [`NOT_AVAILABLE`]
    pub fn unavailable(url: &str) -> Self {
        Self {
            price_per_week: NOT_AVAILABLE.to_string(),
            beds: NOT_AVAILABLE.to_string(),
            baths: NOT_AVAILABLE.to_string(),
            persons: NOT_AVAILABLE.to_string(),
            room_overview: NOT_AVAILABLE.to_string(),
            property_features: NOT_AVAILABLE.to_string(),
            property_about: NOT_AVAILABLE.to_string(),
            flatmates_about: NOT_AVAILABLE.to_string(),
            district: NOT_AVAILABLE.to_string(),
            source_url: url.to_string(),
        }
    }
}
