//! Parsing error types for order-page extraction
//!
//! Two kinds of failure live here: `ParsingError` is a construction-time
//! fault (bad selector, bad base URL) and aborts before any page is read;
//! `OrderSkip` is a per-card fault that drops one order and lets the batch
//! continue.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector for '{field}': {selector} - {reason}")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },

    #[error("Invalid base URL: {url} - {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ParsingError {
    /// Create an invalid selector error for a named selector field
    pub fn invalid_selector(field: &str, selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            field: field.to_string(),
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_base_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidBaseUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

/// Why an order card produced no record
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSkip {
    #[error("order card has no order id element")]
    MissingOrderId,

    #[error("order id element is empty")]
    EmptyOrderId,
}

/// A dropped order card and the reason it was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOrder {
    /// Zero-based position of the card on its page
    pub index: usize,
    pub reason: OrderSkip,
}
