use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::LoggingError;

/// Installs console and JSON file logging for the binary.
///
/// Library code only emits `tracing` events; nothing in the crate installs a
/// subscriber on its own. The returned guard flushes the file writer when
/// dropped, so keep it alive for the life of the process.
pub fn init_logging(log_dir: &str) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_string(),
        source,
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("catalog_etl.log")
        .build(log_dir)?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise info for everything
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_etl=info,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_unusable_log_dir_is_an_error() {
        // A regular file cannot hold a log directory
        let file = NamedTempFile::new().unwrap();
        let log_dir = file.path().join("logs");

        match init_logging(log_dir.to_str().unwrap()) {
            Err(LoggingError::CreateDir { path, .. }) => {
                assert_eq!(path, log_dir.to_str().unwrap())
            }
            other => panic!("expected directory error, got {:?}", other.map(|_| ())),
        }
    }
}
