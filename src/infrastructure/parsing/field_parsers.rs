//! Text-to-value converters for scraped order fields
//!
//! Every function here is total: malformed input yields `None` (or the
//! documented default), never an error.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Date layouts tried by [`extract_date`], highest priority first
pub const DATE_LAYOUTS: &[&str] = &[
    "%B %d, %Y", // January 1, 2023
    "%b %d, %Y", // Jan 1, 2023
    "%d %B %Y",  // 1 January 2023
    "%d %b %Y",  // 1 Jan 2023
    "%Y-%m-%d",  // 2023-01-01
    "%m/%d/%Y",  // 01/01/2023
];

static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,]+\.\d+").expect("price regex"));

static ORDER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\d+-){2}\d+").expect("order id regex"));

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("quantity regex"));

static PRODUCT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([A-Z0-9]{10})(?:/|\?|$)").expect("product code regex"));

static MONTH_NAME_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d+,\s+\d{4}",
    )
    .expect("month name date regex")
});

/// Collapse whitespace runs (including non-breaking space) to single spaces,
/// drop control and zero-width characters, and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace())
        .map(|word| {
            word.chars()
                .filter(|c| !c.is_control() && !is_zero_width(*c))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// First `digits.digits` number after stripping thousands separators.
/// "$1,234.56" → 1234.56; "$12" → None.
pub fn extract_price(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let stripped = text.replace(',', "");
    PRICE_RE
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Canonical `NNN-NNNNNNN-NNNNNNN` id found anywhere in the text.
/// Falls back to the cleaned raw text so a malformed id still persists.
pub fn extract_order_id(text: &str) -> String {
    match ORDER_ID_RE.find(text) {
        Some(m) => m.as_str().to_string(),
        None => clean_text(text),
    }
}

/// Parse a date using [`DATE_LAYOUTS`]; first layout that matches wins
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(&cleaned, layout).ok())
}

/// First "Month D, YYYY" occurrence in free text
pub fn find_month_name_date(text: &str) -> Option<&str> {
    MONTH_NAME_DATE_RE.find(text).map(|m| m.as_str())
}

/// First integer in the text; 1 when absent, unparseable or zero
pub fn extract_quantity(text: &str) -> u32 {
    QUANTITY_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|quantity| *quantity > 0)
        .unwrap_or(1)
}

/// 10-character uppercase alphanumeric path segment of a product link
pub fn extract_product_code(url: &str) -> Option<String> {
    PRODUCT_CODE_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
