use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CSV_PATH, DEFAULT_MAX_ITEMS, DEFAULT_MAX_PAGES,
    DEFAULT_SHEETS_RANGE, DEFAULT_SHEETS_TOKEN_ENV, DEFAULT_SQLITE_TABLE, DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub base_url: String,
    pub max_pages: i64,
    pub max_items: i64,
    pub timeout_seconds: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            max_items: DEFAULT_MAX_ITEMS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Sinks are enabled by the presence of their table. Without any `[load]`
/// section only the CSV sink runs.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    pub csv: Option<CsvConfig>,
    pub sqlite: Option<SqliteConfig>,
    pub sheets: Option<SheetsConfig>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            csv: Some(CsvConfig {
                path: DEFAULT_CSV_PATH.to_string(),
            }),
            sqlite: None,
            sheets: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    pub path: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_range")]
    pub range: String,
    /// Service account JSON key used to sign in
    #[serde(default)]
    pub credentials_path: Option<String>,
    /// Environment variable with a ready-made access token; overrides the key file when set
    #[serde(default = "default_token_env")]
    pub access_token_env: String,
}

fn default_table() -> String {
    DEFAULT_SQLITE_TABLE.to_string()
}

fn default_range() -> String {
    DEFAULT_SHEETS_RANGE.to_string()
}

fn default_token_env() -> String {
    DEFAULT_SHEETS_TOKEN_ENV.to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Loads `path` if it exists, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(config.extract.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.extract.max_pages, 50);
        assert_eq!(config.extract.max_items, 1000);
        assert_eq!(config.extract.timeout_seconds, 30);
        assert_eq!(config.load.csv.unwrap().path, "products.csv");
        assert!(config.load.sqlite.is_none());
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[extract]
max_pages = 3

[load.sqlite]
path = "catalog.db"

[load.sheets]
spreadsheet_id = "abc"
credentials_path = "service_account.json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.extract.max_pages, 3);
        assert_eq!(config.extract.max_items, 1000);
        let sqlite = config.load.sqlite.unwrap();
        assert_eq!(sqlite.table, "products");
        let sheets = config.load.sheets.unwrap();
        assert_eq!(sheets.range, "Sheet1!A1");
        assert_eq!(sheets.access_token_env, "GOOGLE_SHEETS_TOKEN");
        assert_eq!(sheets.credentials_path.as_deref(), Some("service_account.json"));
        // Naming any sink means only the named sinks run
        assert!(config.load.csv.is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[extract]\nmax_pages = \"many\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
