//! Parsing context for order-page extraction
//!
//! Provides the per-page state an extraction needs but cannot read from the
//! markup itself.

use chrono::{DateTime, Utc};
use url::Url;

use super::error::{ParsingError, ParsingResult};

/// Context information for parsing one page snapshot
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// 1-based page number within the current traversal
    pub page_number: u32,

    /// When the snapshot was taken; stamped into degraded dates
    pub extracted_at: DateTime<Utc>,

    /// Site root for resolving relative item links
    pub base_url: Url,
}

impl ParseContext {
    /// Create a context stamped with the current time
    pub fn new(page_number: u32, base_url: &str) -> ParsingResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ParsingError::invalid_base_url(base_url, e))?;
        Ok(Self {
            page_number,
            extracted_at: Utc::now(),
            base_url,
        })
    }

    /// Override the extraction timestamp
    pub fn with_extracted_at(mut self, extracted_at: DateTime<Utc>) -> Self {
        self.extracted_at = extracted_at;
        self
    }

    /// Absolute form of `href`; `None` when it cannot be joined onto the base
    pub fn resolve_url(&self, href: &str) -> Option<String> {
        self.base_url.join(href).ok().map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_base() {
        let ctx = ParseContext::new(1, "https://www.amazon.com").unwrap();
        assert_eq!(
            ctx.resolve_url("/gp/product/B08N5WRWNW/ref=x").as_deref(),
            Some("https://www.amazon.com/gp/product/B08N5WRWNW/ref=x")
        );
        assert_eq!(
            ctx.resolve_url("https://other.example/dp/B000000001").as_deref(),
            Some("https://other.example/dp/B000000001")
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ParseContext::new(1, "not a url").unwrap_err();
        assert!(matches!(err, ParsingError::InvalidBaseUrl { .. }));
    }
}
