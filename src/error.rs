use thiserror::Error;

/// Machine-readable reason behind an [`ExtractionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    InvalidArgument,
    NoData,
    Unexpected,
}

/// The only error `Extractor::extract` hands back to its caller.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    InvalidArgument(String),

    #[error("Extraction failed: No data was extracted from any page")]
    NoData,

    #[error("Extraction failed: {0}")]
    Unexpected(String),
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::InvalidArgument(_) => ExtractionErrorKind::InvalidArgument,
            ExtractionError::NoData => ExtractionErrorKind::NoData,
            ExtractionError::Unexpected(_) => ExtractionErrorKind::Unexpected,
        }
    }
}

/// Failure to retrieve one page. Recovered by skipping the page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
}

/// Failure to turn one card fragment into a record. Recovered by skipping the card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed field: {0}")]
    MalformedField(&'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("Failed to transform data: input dataset is empty")]
    EmptyInput,
}

/// Failure of a single sink. Never rolls back the other sinks.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid sink argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot save an empty dataset")]
    EmptyDataset,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote service responded with status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Failed to read service account key '{path}': {source}")]
    Credentials {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid service account key: {0}")]
    InvalidCredentials(String),

    #[error("Failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Sink worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_errors_share_prefix_and_expose_kind() {
        let err = ExtractionError::InvalidArgument("max_pages must be a positive integer".into());
        assert_eq!(
            err.to_string(),
            "Extraction failed: max_pages must be a positive integer"
        );
        assert_eq!(err.kind(), ExtractionErrorKind::InvalidArgument);

        let err = ExtractionError::NoData;
        assert!(err.to_string().contains("No data was extracted from any page"));
        assert_eq!(err.kind(), ExtractionErrorKind::NoData);
    }

    #[test]
    fn card_errors_name_the_field() {
        assert_eq!(
            CardError::MalformedField("price").to_string(),
            "Malformed field: price"
        );
        assert_eq!(
            CardError::MissingField("title").to_string(),
            "Missing required field: title"
        );
    }
}
