use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::constants::{
    CARD_SELECTOR, CURRENCY_MARKER, DETAILS_SELECTOR, DETAIL_LINE_COUNT, DETAIL_LINE_SELECTOR,
    PRICE_SELECTOR, RATING_MARKER, TITLE_SELECTOR,
};
use crate::error::CardError;
use crate::types::RawRecord;

static CARD: Lazy<Selector> = Lazy::new(|| selector(CARD_SELECTOR));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(TITLE_SELECTOR));
static PRICE: Lazy<Selector> = Lazy::new(|| selector(PRICE_SELECTOR));
static DETAILS: Lazy<Selector> = Lazy::new(|| selector(DETAILS_SELECTOR));
static DETAIL_LINE: Lazy<Selector> = Lazy::new(|| selector(DETAIL_LINE_SELECTOR));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("card selectors are static and valid")
}

/// All card fragments of a page, in document order.
pub fn card_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&CARD).collect()
}

/// Parses one card fragment.
///
/// Title, price, the 4-line details block, colors, size and gender are
/// required; any of them failing rejects the whole card. An unreadable rating
/// only yields `rating: None`.
pub fn parse_card(card: ElementRef<'_>, captured_at: DateTime<Utc>) -> Result<RawRecord, CardError> {
    let title = card
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or(CardError::MissingField("title"))?;

    let price_text = card
        .select(&PRICE)
        .next()
        .map(element_text)
        .ok_or(CardError::MissingField("price"))?;
    let price = parse_price(&price_text).ok_or(CardError::MalformedField("price"))?;

    let details = card
        .select(&DETAILS)
        .next()
        .ok_or(CardError::MissingField("details"))?;
    let lines: Vec<String> = details.select(&DETAIL_LINE).map(element_text).collect();
    if lines.len() != DETAIL_LINE_COUNT {
        return Err(CardError::MalformedField("details"));
    }

    let rating = parse_rating(&lines[0]);
    let colors = parse_colors(&lines[1]).ok_or(CardError::MalformedField("colors"))?;
    let size = labelled_value(&lines[2]).ok_or(CardError::MalformedField("size"))?;
    let gender = labelled_value(&lines[3]).ok_or(CardError::MalformedField("gender"))?;

    Ok(RawRecord {
        title,
        price,
        rating,
        colors,
        size,
        gender,
        timestamp: captured_at,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .trim_start_matches(CURRENCY_MARKER)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

/// "Rating: ⭐ 4.8 / 5" -> 4.8
fn parse_rating(line: &str) -> Option<f64> {
    let (_, after_marker) = line.split_once(RATING_MARKER)?;
    after_marker
        .split('/')
        .next()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
}

/// "3 Colors" -> 3
fn parse_colors(line: &str) -> Option<i64> {
    line.split_whitespace().next()?.parse::<i64>().ok()
}

/// "Size: M" -> "M"
fn labelled_value(line: &str) -> Option<String> {
    let (_, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
