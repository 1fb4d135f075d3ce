use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::ExtractionError;
use crate::extract::card;
use crate::extract::fetcher::PageFetcher;
use crate::types::{ExtractionRun, RawRecord};

/// Outcome of parsing the cards of one page
#[derive(Debug, Default)]
struct PageOutcome {
    cards: usize,
    records: Vec<RawRecord>,
}

/// Walks the catalog page by page, turning cards into records.
pub struct Extractor {
    fetcher: Box<dyn PageFetcher>,
}

impl Extractor {
    pub fn new(fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Visits up to `page_limit` pages in order and stops as soon as
    /// `item_limit` records have been collected, even mid-page.
    ///
    /// Pages that fail to fetch and cards that fail to parse are skipped.
    /// Finishing with no records at all is an error.
    #[instrument(skip(self))]
    pub async fn extract(
        &self,
        base_url: &str,
        page_limit: i64,
        item_limit: i64,
    ) -> Result<ExtractionRun, ExtractionError> {
        let (page_limit, item_limit) = validate_args(base_url, page_limit, item_limit)?;

        let captured_at = Utc::now();
        let mut run = ExtractionRun::default();

        for page in 1..=page_limit {
            let url = page_url(base_url, page);
            info!("Scraping page {}: {}", page, url);

            let t_fetch = Instant::now();
            let fetched = match self.fetcher.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    error!("Failed to fetch page {}: {}", page, e);
                    counter!("catalog_pages_failed_total").increment(1);
                    run.failed_pages.push(page);
                    continue;
                }
            };
            histogram!("catalog_page_fetch_seconds").record(t_fetch.elapsed().as_secs_f64());
            counter!("catalog_pages_fetched_total").increment(1);

            let remaining = item_limit - run.records.len();
            let outcome = guard_unexpected(|| parse_page(&fetched.body, page, captured_at, remaining))
                .inspect_err(|e| error!("Critical error during extraction: {}", e))?;

            if outcome.cards == 0 {
                warn!("No product cards found on page {}", page);
                continue;
            }

            counter!("catalog_records_extracted_total").increment(outcome.records.len() as u64);
            run.records.extend(outcome.records);

            if run.records.len() >= item_limit {
                info!("Reached maximum items limit: {}", item_limit);
                return Ok(run);
            }
        }

        if run.records.is_empty() {
            error!(
                "No data was extracted from any page (failed pages: {:?})",
                run.failed_pages
            );
            return Err(ExtractionError::NoData);
        }

        if !run.failed_pages.is_empty() {
            warn!("Failed to extract from pages: {:?}", run.failed_pages);
        }

        info!("Extracted {} records", run.records.len());
        Ok(run)
    }
}

fn validate_args(
    base_url: &str,
    page_limit: i64,
    item_limit: i64,
) -> Result<(u32, usize), ExtractionError> {
    let has_web_scheme = Url::parse(base_url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !has_web_scheme {
        return Err(ExtractionError::InvalidArgument(
            "Invalid base URL provided".to_string(),
        ));
    }

    if page_limit <= 0 {
        return Err(ExtractionError::InvalidArgument(
            "max_pages must be a positive integer".to_string(),
        ));
    }
    let page_limit = u32::try_from(page_limit).map_err(|_| {
        ExtractionError::InvalidArgument(format!("max_pages must not exceed {}", u32::MAX))
    })?;

    if item_limit <= 0 {
        return Err(ExtractionError::InvalidArgument(
            "max_items must be a positive integer".to_string(),
        ));
    }
    let item_limit = usize::try_from(item_limit).map_err(|_| {
        ExtractionError::InvalidArgument(format!("max_items must not exceed {}", usize::MAX))
    })?;

    Ok((page_limit, item_limit))
}

/// Page 1 is the base address itself; later pages live at `{base}/page{n}`.
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{}/page{}", base_url.strip_suffix('/').unwrap_or(base_url), page)
    }
}

/// Parses cards in document order, stopping once `remaining` records are in hand.
fn parse_page(markup: &str, page: u32, captured_at: DateTime<Utc>, remaining: usize) -> PageOutcome {
    let document = Html::parse_document(markup);
    let cards = card::card_fragments(&document);

    let mut outcome = PageOutcome {
        cards: cards.len(),
        records: Vec::new(),
    };

    for fragment in cards {
        match card::parse_card(fragment, captured_at) {
            Ok(record) => {
                debug!("Parsed product: {}", record.title);
                outcome.records.push(record);
                if outcome.records.len() >= remaining {
                    break;
                }
            }
            Err(e) => {
                warn!("Error processing product card on page {}: {}", page, e);
                counter!("catalog_cards_skipped_total").increment(1);
            }
        }
    }

    outcome
}

/// Runs page parsing, folding any panic into `ExtractionError::Unexpected`.
/// Records already collected by the caller are dropped along with the error.
fn guard_unexpected<T>(f: impl FnOnce() -> T) -> Result<T, ExtractionError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ExtractionError::Unexpected(message)
    })
}
