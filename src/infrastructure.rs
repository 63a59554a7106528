//! Infrastructure layer for browser automation, parsing, configuration and exports
//!
//! This module provides the browser driver abstraction and its WebDriver
//! client, order-page parsing, layered configuration, logging and the
//! CSV/JSON export writers.

pub mod browser; // Browser driver trait and element handles
pub mod config; // Configuration layering and defaults
pub mod export; // CSV and JSON export writers
pub mod logging; // Logging infrastructure
pub mod parsing; // Order-page parsing
pub mod parsing_error; // Parsing error types
pub mod webdriver_client; // W3C WebDriver implementation of BrowserDriver

// Re-export commonly used items
pub use browser::{BrowserDriver, DriverError, DriverResult, ElementHandle};
pub use config::{AppConfig, ConfigError};
pub use export::{ExportError, ExportReport, export_orders};
pub use logging::{init_logging_with_config, log_system_info};
pub use parsing::{OrderListParser, OrderPageSelectors, ParseContext, ParsingError, ParsingResult};
pub use webdriver_client::WebDriverSession;
