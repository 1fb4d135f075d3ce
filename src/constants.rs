//! Defaults for the catalog this pipeline was built against.
//! Config files and CLI flags override all of them.

pub const DEFAULT_BASE_URL: &str = "https://fashion-studio.dicoding.dev";
pub const DEFAULT_MAX_PAGES: i64 = 50;
pub const DEFAULT_MAX_ITEMS: i64 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_CONFIG_PATH: &str = "catalog_etl.toml";
pub const DEFAULT_CSV_PATH: &str = "products.csv";
pub const DEFAULT_SQLITE_TABLE: &str = "products";
pub const DEFAULT_SHEETS_RANGE: &str = "Sheet1!A1";
pub const DEFAULT_SHEETS_TOKEN_ENV: &str = "GOOGLE_SHEETS_TOKEN";
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Lifetime requested for service account assertions
pub const SERVICE_ACCOUNT_TOKEN_SECS: i64 = 3600;

// Card markup
pub const CARD_SELECTOR: &str = "div.collection-card";
pub const TITLE_SELECTOR: &str = "h3.product-title";
pub const PRICE_SELECTOR: &str = "span.price";
pub const DETAILS_SELECTOR: &str = "div.product-details";
pub const DETAIL_LINE_SELECTOR: &str = "p";
pub const DETAIL_LINE_COUNT: usize = 4;

pub const RATING_MARKER: char = '⭐';
pub const CURRENCY_MARKER: char = '$';

// Transform fill values
pub const UNKNOWN_TITLE: &str = "Unknown Product";
pub const UNSPECIFIED_SIZE: &str = "Not Specified";
pub const DEFAULT_GENDER: &str = "Unisex";
