use std::path::PathBuf;

use metrics::counter;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::{ExtractConfig, LoadConfig, SheetsConfig};
use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::load::{CsvSink, SheetsAuth, SheetsSink, Sink, SqliteSink};
use crate::transform::{self, ValidationReport};
use crate::types::CleanRecord;

/// What one sink reported for a run
#[derive(Debug, Clone, Serialize)]
pub struct SinkOutcome {
    pub sink: String,
    /// Where the data landed, or why it did not
    pub result: Result<String, String>,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub extracted: usize,
    pub failed_pages: Vec<u32>,
    pub records: Vec<CleanRecord>,
    pub validation: ValidationReport,
    pub sink_outcomes: Vec<SinkOutcome>,
}

impl PipelineResult {
    pub fn failed_sinks(&self) -> Vec<&SinkOutcome> {
        self.sink_outcomes.iter().filter(|o| o.result.is_err()).collect()
    }
}

pub struct Pipeline {
    extractor: Extractor,
    sinks: Vec<Box<dyn Sink>>,
}

impl Pipeline {
    pub fn new(extractor: Extractor, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { extractor, sinks }
    }

    /// Extract, transform and validate; extraction or transform failures are fatal.
    pub async fn extract_and_transform(
        &self,
        settings: &ExtractConfig,
    ) -> Result<PipelineResult, PipelineError> {
        let run = self
            .extractor
            .extract(&settings.base_url, settings.max_pages, settings.max_items)
            .await?;
        let extracted = run.len();
        let failed_pages = run.failed_pages.clone();

        let records = transform::transform(&run.into_records())?;
        let validation = transform::validate(&records)?;

        Ok(PipelineResult {
            extracted,
            failed_pages,
            records,
            validation,
            sink_outcomes: Vec::new(),
        })
    }

    /// Runs the whole ETL. Every sink is attempted even if an earlier one fails.
    #[instrument(skip(self, settings), fields(base_url = %settings.base_url, sinks = self.sinks.len()))]
    pub async fn run(&self, settings: &ExtractConfig) -> Result<PipelineResult, PipelineError> {
        info!("Starting pipeline");
        let mut result = self.extract_and_transform(settings).await?;
        info!(
            "Transformed {} records ({} failed pages)",
            result.records.len(),
            result.failed_pages.len()
        );

        for sink in &self.sinks {
            let outcome = match sink.save(&result.records).await {
                Ok(location) => {
                    info!("Saved to {}: {}", sink.name(), location);
                    Ok(location)
                }
                Err(e) => {
                    error!("Error saving to {}: {}", sink.name(), e);
                    counter!("catalog_sink_failures_total", "sink" => sink.name()).increment(1);
                    Err(e.to_string())
                }
            };
            result.sink_outcomes.push(SinkOutcome {
                sink: sink.name().to_string(),
                result: outcome,
            });
        }

        if !result.failed_sinks().is_empty() {
            warn!("{} of {} sinks failed", result.failed_sinks().len(), self.sinks.len());
        }
        Ok(result)
    }
}

/// Builds the sinks named in the load config, in csv, sqlite, sheets order.
///
/// A Sheets sink without usable credentials is still built; it fails at
/// save time like any other misconfigured sink.
pub fn build_sinks(load: &LoadConfig) -> Vec<Box<dyn Sink>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    if let Some(csv) = &load.csv {
        sinks.push(Box::new(CsvSink::new(&csv.path)));
    }
    if let Some(sqlite) = &load.sqlite {
        sinks.push(Box::new(SqliteSink::new(&sqlite.path, &sqlite.table)));
    }
    if let Some(sheets) = &load.sheets {
        let auth = sheets_auth(sheets, std::env::var(&sheets.access_token_env).ok());
        sinks.push(Box::new(SheetsSink::new(
            &sheets.spreadsheet_id,
            &sheets.range,
            auth,
        )));
    }
    sinks
}

/// A token from the environment wins over the key file.
fn sheets_auth(sheets: &SheetsConfig, env_token: Option<String>) -> SheetsAuth {
    match (env_token.filter(|t| !t.trim().is_empty()), &sheets.credentials_path) {
        (Some(token), _) => SheetsAuth::AccessToken(token),
        (None, Some(path)) => SheetsAuth::ServiceAccount(PathBuf::from(path)),
        (None, None) => {
            warn!(
                "Neither {} nor credentials_path is set; Google Sheets upload will fail",
                sheets.access_token_env
            );
            SheetsAuth::AccessToken(String::new())
        }
    }
}
