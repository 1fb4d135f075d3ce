use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column names shared by every tabular consumer, in output order.
pub const COLUMNS: [&str; 7] = [
    "Title",
    "Price",
    "Rating",
    "Colors",
    "Size",
    "Gender",
    "Timestamp",
];

/// One scraped catalog item before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Colors")]
    pub colors: i64,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    /// Capture time of the whole extraction call, not of this item
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Records and failed pages gathered by one `extract` call
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    pub records: Vec<RawRecord>,
    /// 1-based page indices that could not be fetched, in visit order
    pub failed_pages: Vec<u32>,
}

impl ExtractionRun {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

/// A record after type coercion and null-filling, ready for the sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Rating")]
    pub rating: i64,
    #[serde(rename = "Colors")]
    pub colors: f64,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}
