//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional TOML/JSON file
//! 3. `ORDER_HISTORY__SECTION__KEY` environment variables
//!
//! Command-line overrides are applied by the binary on top of the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::infrastructure::parsing::{OrderListParser, OrderPageSelectors};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub extraction: ExtractionConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Which site to read and how to recognize its sign-in page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Host name, or a full origin such as `https://www.amazon.co.uk`
    pub domain: String,

    /// Order-history URL; derived from `domain` when empty
    pub orders_url: String,

    /// Page title shown while the user still has to sign in
    pub sign_in_title: String,
}

/// Settings consumed by the traversal controller and page extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Order ids for targeted search; empty means full scan
    pub target_ids: Vec<String>,

    /// Page ceiling for full scans; `None` walks every page
    pub max_pages: Option<u32>,

    /// Year (`2023`) or raw time-filter option value (`months-3`)
    pub year_filter: Option<String>,

    /// Bound for ordinary page-load waits
    pub timeout_ms: u64,

    /// Bound for the manual sign-in wait
    pub login_timeout_ms: u64,

    /// Pause between successive targeted searches
    pub search_delay_ms: u64,

    /// Result pages read per targeted search
    pub search_result_pages: u32,

    pub selectors: OrderPageSelectors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

/// WebDriver connection and browser window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// chromedriver / geckodriver endpoint
    pub webdriver_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,

    /// Pause before closing the browser at the end of a run
    pub close_delay_ms: u64,
}

/// Export destinations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub csv_filename: String,
    pub json_filename: String,

    /// Write the extraction date for orders whose date could not be read
    /// instead of leaving it empty
    pub unknown_date_as_extraction_date: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; platform data directory when unset
    pub directory: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: defaults::SITE_DOMAIN.to_string(),
            orders_url: String::new(),
            sign_in_title: defaults::SIGN_IN_TITLE.to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_ids: Vec::new(),
            max_pages: None,
            year_filter: None,
            timeout_ms: defaults::PAGE_TIMEOUT_MS,
            login_timeout_ms: defaults::LOGIN_TIMEOUT_MS,
            search_delay_ms: defaults::SEARCH_DELAY_MS,
            search_result_pages: defaults::SEARCH_RESULT_PAGES,
            selectors: OrderPageSelectors::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            browser: BrowserKind::Chrome,
            headless: false,
            window_width: defaults::WINDOW_WIDTH,
            window_height: defaults::WINDOW_HEIGHT,
            close_delay_ms: defaults::CLOSE_DELAY_MS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(defaults::OUTPUT_DIR),
            csv_filename: defaults::CSV_FILENAME.to_string(),
            json_filename: defaults::JSON_FILENAME.to_string(),
            unknown_date_as_extraction_date: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

impl SiteConfig {
    /// Site origin without a trailing slash
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    pub fn orders_url(&self) -> String {
        if self.orders_url.trim().is_empty() {
            format!("{}{}", self.base_url(), defaults::ORDER_HISTORY_PATH)
        } else {
            self.orders_url.trim().to_string()
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    /// Option value for the time-filter dropdown: a bare four-digit year
    /// becomes `year-YYYY`, anything else is passed through.
    pub fn year_filter_value(&self) -> Option<String> {
        let filter = self.year_filter.as_deref()?.trim();
        if filter.is_empty() {
            None
        } else if filter.len() == 4 && filter.chars().all(|c| c.is_ascii_digit()) {
            Some(format!("year-{filter}"))
        } else {
            Some(filter.to_string())
        }
    }
}

impl BrowserConfig {
    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }
}

impl OutputConfig {
    pub fn csv_path(&self) -> PathBuf {
        self.directory.join(&self.csv_filename)
    }

    pub fn json_path(&self) -> PathBuf {
        self.directory.join(&self.json_filename)
    }
}

impl LoggingConfig {
    /// Configured directory, else `<data dir>/order-history/logs`, else `./logs`
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join(defaults::APP_DIR_NAME).join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}

impl AppConfig {
    /// Load defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_environment(path, environment())
    }

    /// Same as [`AppConfig::load`] with an explicit environment source
    pub fn load_with_environment(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            info!("Loading configuration file {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Reject settings that would make a run meaningless or unbounded
    pub fn validate(&self) -> Result<(), ConfigError> {
        let extraction = &self.extraction;
        if extraction.max_pages == Some(0) {
            return Err(ConfigError::validation("extraction.max_pages must be at least 1"));
        }
        if extraction.timeout_ms == 0 {
            return Err(ConfigError::validation("extraction.timeout_ms must be greater than 0"));
        }
        if extraction.login_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "extraction.login_timeout_ms must be greater than 0",
            ));
        }
        if extraction.search_result_pages == 0 {
            return Err(ConfigError::validation(
                "extraction.search_result_pages must be at least 1",
            ));
        }
        OrderListParser::new(&extraction.selectors)
            .map_err(|e| ConfigError::validation(e.to_string()))?;

        Url::parse(&self.site.base_url())
            .map_err(|e| ConfigError::validation(format!("site.domain: {e}")))?;
        Url::parse(&self.site.orders_url())
            .map_err(|e| ConfigError::validation(format!("site.orders_url: {e}")))?;
        Url::parse(&self.browser.webdriver_url)
            .map_err(|e| ConfigError::validation(format!("browser.webdriver_url: {e}")))?;

        if self.output.csv_filename.trim().is_empty() {
            return Err(ConfigError::validation("output.csv_filename must not be empty"));
        }
        if self.output.json_filename.trim().is_empty() {
            return Err(ConfigError::validation("output.json_filename must not be empty"));
        }
        Ok(())
    }
}

/// `ORDER_HISTORY__EXTRACTION__MAX_PAGES=3`, `ORDER_HISTORY__EXTRACTION__TARGET_IDS=a,b`
pub fn environment() -> Environment {
    Environment::with_prefix(defaults::ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("extraction.target_ids")
}

/// Default configuration values
pub mod defaults {
    /// Environment variable prefix
    pub const ENV_PREFIX: &str = "ORDER_HISTORY";

    /// Directory name under the platform data directory
    pub const APP_DIR_NAME: &str = "order-history";

    pub const SITE_DOMAIN: &str = "www.amazon.com";
    pub const ORDER_HISTORY_PATH: &str = "/gp/css/order-history";
    pub const SIGN_IN_TITLE: &str = "Amazon Sign-In";

    /// Page-load wait bound in milliseconds
    pub const PAGE_TIMEOUT_MS: u64 = 30_000;

    /// Manual sign-in wait bound in milliseconds
    pub const LOGIN_TIMEOUT_MS: u64 = 300_000;

    /// Delay between targeted searches in milliseconds
    pub const SEARCH_DELAY_MS: u64 = 2_000;

    pub const SEARCH_RESULT_PAGES: u32 = 1;

    pub const WEBDRIVER_URL: &str = "http://localhost:9515";
    pub const WINDOW_WIDTH: u32 = 1280;
    pub const WINDOW_HEIGHT: u32 = 900;
    pub const CLOSE_DELAY_MS: u64 = 2_000;

    pub const OUTPUT_DIR: &str = "output";
    pub const CSV_FILENAME: &str = "amazon_orders.csv";
    pub const JSON_FILENAME: &str = "amazon_orders.json";

    // Logging defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_MAX_FILES: u32 = 7;
}
