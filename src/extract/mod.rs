// Extraction stage: fetch catalog pages and turn product cards into records

pub mod card;
pub mod extractor;
pub mod fetcher;

pub use extractor::Extractor;
pub use fetcher::{FetchedPage, PageFetcher, ReqwestFetcher};
