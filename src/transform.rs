use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::constants::{DEFAULT_GENDER, UNKNOWN_TITLE, UNSPECIFIED_SIZE};
use crate::error::TransformError;
use crate::types::{CleanRecord, RawRecord};

/// Summary of a cleaned dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Null or blank values per column
    pub null_values: BTreeMap<&'static str, usize>,
    pub total_rows: usize,
    pub price_min: f64,
    pub price_max: f64,
    /// Distinct values in first-seen order
    pub unique_genders: Vec<String>,
    pub unique_sizes: Vec<String>,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// Fills missing values and coerces column types.
///
/// Blank title, size and gender get placeholder text, a missing rating becomes
/// 0 and ratings are rounded half-to-even, negative prices are clamped to 0,
/// and color counts are widened to floats.
#[instrument(skip(records), fields(rows = records.len()))]
pub fn transform(records: &[RawRecord]) -> Result<Vec<CleanRecord>, TransformError> {
    if records.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let mut filled = FillCounts::default();
    let cleaned = records
        .iter()
        .map(|raw| CleanRecord {
            title: fill_blank(&raw.title, UNKNOWN_TITLE, &mut filled.title),
            price: raw.price.max(0.0),
            rating: match raw.rating {
                Some(r) => r.round_ties_even() as i64,
                None => {
                    filled.rating += 1;
                    0
                }
            },
            colors: raw.colors as f64,
            size: fill_blank(&raw.size, UNSPECIFIED_SIZE, &mut filled.size),
            gender: fill_blank(&raw.gender, DEFAULT_GENDER, &mut filled.gender),
            timestamp: raw.timestamp,
        })
        .collect();

    if filled.any() {
        info!(
            "Null values handled: title={}, rating={}, size={}, gender={}",
            filled.title, filled.rating, filled.size, filled.gender
        );
    }

    Ok(cleaned)
}

/// Summarises a cleaned dataset for logging and the CLI.
pub fn validate(records: &[CleanRecord]) -> Result<ValidationReport, TransformError> {
    let first = records.first().ok_or(TransformError::EmptyInput)?;

    let blank = |field: fn(&CleanRecord) -> &str| {
        records
            .iter()
            .filter(|r| field(r).trim().is_empty())
            .count()
    };
    let null_values = BTreeMap::from([
        ("Title", blank(|r| r.title.as_str())),
        ("Price", records.iter().filter(|r| r.price.is_nan()).count()),
        ("Rating", 0),
        ("Colors", records.iter().filter(|r| r.colors.is_nan()).count()),
        ("Size", blank(|r| r.size.as_str())),
        ("Gender", blank(|r| r.gender.as_str())),
        ("Timestamp", 0),
    ]);

    let mut report = ValidationReport {
        null_values,
        total_rows: records.len(),
        price_min: first.price,
        price_max: first.price,
        unique_genders: Vec::new(),
        unique_sizes: Vec::new(),
        earliest: first.timestamp,
        latest: first.timestamp,
    };

    for record in records {
        report.price_min = report.price_min.min(record.price);
        report.price_max = report.price_max.max(record.price);
        report.earliest = report.earliest.min(record.timestamp);
        report.latest = report.latest.max(record.timestamp);
        if !report.unique_genders.contains(&record.gender) {
            report.unique_genders.push(record.gender.clone());
        }
        if !report.unique_sizes.contains(&record.size) {
            report.unique_sizes.push(record.size.clone());
        }
    }

    info!("Data validation completed successfully");
    Ok(report)
}

#[derive(Default)]
struct FillCounts {
    title: usize,
    rating: usize,
    size: usize,
    gender: usize,
}

impl FillCounts {
    fn any(&self) -> bool {
        self.title + self.rating + self.size + self.gender > 0
    }
}

fn fill_blank(value: &str, fallback: &str, counter: &mut usize) -> String {
    if value.trim().is_empty() {
        *counter += 1;
        fallback.to_string()
    } else {
        value.to_string()
    }
}
