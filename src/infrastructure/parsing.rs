//! HTML parsing infrastructure for order-history pages
//!
//! Extraction runs on parsed page snapshots through the `PageView` trait,
//! with selector configuration validated once at parser construction.

pub mod config;
pub mod context;
pub mod error;
pub mod field_parsers;
pub mod order_list_parser;
pub mod page_view;

// Re-export public types
pub use config::OrderPageSelectors;
pub use context::ParseContext;
pub use error::{OrderSkip, ParsingError, ParsingResult, SkippedOrder};
pub use order_list_parser::{OrderListParser, PageExtraction};
pub use page_view::{HtmlDocumentView, HtmlElementView, PageView};
