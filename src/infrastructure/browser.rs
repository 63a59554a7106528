//! Browser driver abstraction
//!
//! Every browser interaction in the crate goes through `BrowserDriver`; these
//! calls are the only suspension points of a run. Elements are addressed by
//! opaque handles that are only meaningful to the driver that issued them.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Interval between `query_selector` polls in the default `wait_for_element`
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opaque reference to an element on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("WebDriver error '{error}': {message}")]
    Protocol { error: String, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid WebDriver response: {0}")]
    InvalidResponse(String),

    #[error("Browser session is closed")]
    SessionClosed,
}

impl DriverError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Minimal browser automation surface needed to walk order history
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    async fn title(&self) -> DriverResult<String>;

    /// First element matching `selector`, `None` when absent
    async fn query_selector(&self, selector: &str) -> DriverResult<Option<ElementHandle>>;

    async fn query_selector_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    async fn text(&self, element: &ElementHandle) -> DriverResult<String>;

    async fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Replace the contents of an input element
    async fn fill_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Choose the `<option>` with the given value inside a `<select>`
    async fn select_option(&self, element: &ElementHandle, value: &str) -> DriverResult<()>;

    /// Wait until the page has finished loading
    async fn wait_for_network_idle(&self, timeout: Duration) -> DriverResult<()>;

    /// Serialized DOM of the current page
    async fn page_source(&self) -> DriverResult<String>;

    async fn close(&self) -> DriverResult<()>;

    /// Poll for `selector` until it appears or `timeout` elapses
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> DriverResult<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.query_selector(selector).await? {
                return Ok(element);
            }
            let now = Instant::now();
            if now >= deadline {
                debug!("Gave up waiting for '{}' after {:?}", selector, timeout);
                return Err(DriverError::timeout(format!("element '{selector}'"), timeout));
            }
            sleep(ELEMENT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
