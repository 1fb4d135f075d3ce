// Load stage: persist the cleaned dataset to each configured sink

pub mod csv_file;
pub mod google_auth;
pub mod sheets;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::types::CleanRecord;

pub use csv_file::CsvSink;
pub use sheets::{SheetsAuth, SheetsSink};
pub use sqlite::SqliteSink;

/// A destination for the cleaned dataset.
///
/// Sinks are independent: a failure in one is reported to the caller and
/// never undoes what another sink already wrote.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in logs and run summaries
    fn name(&self) -> &'static str;

    /// Writes every record and returns a description of where they landed.
    async fn save(&self, records: &[CleanRecord]) -> Result<String, LoadError>;
}

pub(crate) fn ensure_not_empty(records: &[CleanRecord]) -> Result<(), LoadError> {
    if records.is_empty() {
        Err(LoadError::EmptyDataset)
    } else {
        Ok(())
    }
}

pub(crate) fn require(value: &str, what: &str) -> Result<(), LoadError> {
    if value.trim().is_empty() {
        Err(LoadError::InvalidArgument(format!("{what} is required")))
    } else {
        Ok(())
    }
}
