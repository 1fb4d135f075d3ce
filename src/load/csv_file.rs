use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::LoadError;
use crate::load::{ensure_not_empty, require, Sink};
use crate::types::CleanRecord;

/// Writes the dataset to a CSV file with a header row, replacing any existing file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn save(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        ensure_not_empty(records)?;
        require(&self.path.to_string_lossy(), "Output path")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        let location = self.path.to_string_lossy().to_string();
        info!("Successfully saved {} rows to CSV: {}", records.len(), location);
        Ok(location)
    }
}
