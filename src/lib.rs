//! Extract-transform-load pipeline for a paginated product catalog.
//!
//! [`extract`] crawls catalog pages and parses product cards into
//! [`types::RawRecord`]s, [`transform`] fills and coerces them, and [`load`]
//! writes the cleaned table to CSV, SQLite and Google Sheets.

pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod types;
