//! W3C WebDriver client
//!
//! Implements [`BrowserDriver`] by speaking the WebDriver wire protocol to a
//! running chromedriver or geckodriver over HTTP.

#![allow(clippy::uninlined_format_args)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::infrastructure::browser::{BrowserDriver, DriverError, DriverResult, ElementHandle};
use crate::infrastructure::config::{BrowserConfig, BrowserKind};

/// Key under which W3C drivers return element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f4f7a7d7c01";

/// Per-request HTTP timeout; waits are done by polling, never by one long request
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// New-session capabilities for the configured browser
pub fn capabilities(config: &BrowserConfig) -> Value {
    let window = (config.window_width, config.window_height);
    match config.browser {
        BrowserKind::Chrome => {
            let mut args = vec![
                format!("--window-size={},{}", window.0, window.1),
                "--disable-blink-features=AutomationControlled".to_string(),
            ];
            if config.headless {
                args.push("--headless=new".to_string());
            }
            json!({
                "capabilities": {
                    "alwaysMatch": {
                        "browserName": "chrome",
                        "goog:chromeOptions": { "args": args }
                    }
                }
            })
        }
        BrowserKind::Firefox => {
            let mut args = vec![
                format!("--width={}", window.0),
                format!("--height={}", window.1),
            ];
            if config.headless {
                args.push("-headless".to_string());
            }
            json!({
                "capabilities": {
                    "alwaysMatch": {
                        "browserName": "firefox",
                        "moz:firefoxOptions": { "args": args }
                    }
                }
            })
        }
    }
}

/// Unwrap a WebDriver response body into its `value`, mapping error payloads
pub fn parse_response(status: u16, mut body: Value) -> DriverResult<Value> {
    let value = body
        .get_mut("value")
        .map(Value::take)
        .ok_or_else(|| DriverError::InvalidResponse(format!("missing 'value' in {body}")))?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(match error {
            "no such element" | "stale element reference" => DriverError::NoSuchElement(message),
            "timeout" | "script timeout" => DriverError::Timeout {
                what: message,
                timeout_ms: 0,
            },
            "invalid session id" => DriverError::SessionClosed,
            other => DriverError::Protocol {
                error: other.to_string(),
                message,
            },
        });
    }

    if !(200..300).contains(&status) {
        return Err(DriverError::Protocol {
            error: format!("HTTP {status}"),
            message: value.to_string(),
        });
    }
    Ok(value)
}

/// Element handle from a find-element result
pub fn element_from_value(value: &Value) -> DriverResult<ElementHandle> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementHandle(id.to_string()))
        .ok_or_else(|| DriverError::InvalidResponse(format!("not an element reference: {value}")))
}

/// CSS selector for the `<option>` carrying `value`
pub fn option_selector(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("option[value=\"{escaped}\"]")
}

fn css_locator(selector: &str) -> Value {
    json!({ "using": "css selector", "value": selector })
}

/// One WebDriver session
pub struct WebDriverSession {
    client: Client,
    session_url: String,
    closed: AtomicBool,
}

impl WebDriverSession {
    /// Start a browser through the WebDriver endpoint in `config`
    pub async fn connect(config: &BrowserConfig) -> DriverResult<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let endpoint = config.webdriver_url.trim_end_matches('/').to_string();

        info!("Starting {:?} session via {}", config.browser, endpoint);
        let response = client
            .post(format!("{endpoint}/session"))
            .json(&capabilities(config))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
        let value = parse_response(status, body)?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::InvalidResponse(format!("missing sessionId in {value}")))?;
        debug!("WebDriver session {} created", session_id);

        Ok(Self {
            client,
            session_url: format!("{endpoint}/session/{session_id}"),
            closed: AtomicBool::new(false),
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> DriverResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::SessionClosed);
        }
        let url = if path.is_empty() {
            self.session_url.clone()
        } else {
            format!("{}/{}", self.session_url, path)
        };

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
        parse_response(status, payload)
    }

    async fn get(&self, path: &str) -> DriverResult<Value> {
        self.command(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> DriverResult<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn string_value(&self, path: &str) -> DriverResult<String> {
        let value = self.get(path).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::InvalidResponse(format!("expected string from {path}, got {value}")))
    }
}

#[async_trait]
impl BrowserDriver for WebDriverSession {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("Navigating to {}", url);
        self.post("url", json!({ "url": url }))
            .await
            .map(|_| ())
            .map_err(|e| match e {
                DriverError::Protocol { message, .. } => DriverError::Navigation(format!("{url}: {message}")),
                other => other,
            })
    }

    async fn title(&self) -> DriverResult<String> {
        self.string_value("title").await
    }

    async fn query_selector(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        match self.post("element", css_locator(selector)).await {
            Ok(value) => element_from_value(&value).map(Some),
            Err(DriverError::NoSuchElement(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn query_selector_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let value = self.post("elements", css_locator(selector)).await?;
        value
            .as_array()
            .ok_or_else(|| DriverError::InvalidResponse(format!("expected element list, got {value}")))?
            .iter()
            .map(element_from_value)
            .collect()
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let value = self
            .get(&format!("element/{}/attribute/{}", element.id(), name))
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        self.string_value(&format!("element/{}/text", element.id())).await
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        self.post(&format!("element/{}/click", element.id()), json!({}))
            .await
            .map(|_| ())
    }

    async fn fill_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        self.post(&format!("element/{}/clear", element.id()), json!({}))
            .await?;
        self.post(&format!("element/{}/value", element.id()), json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> DriverResult<()> {
        let option = self
            .post(
                &format!("element/{}/element", element.id()),
                css_locator(&option_selector(value)),
            )
            .await?;
        let option = element_from_value(&option)?;
        self.click(&option).await
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> DriverResult<()> {
        let deadline = Instant::now() + timeout;
        let script = json!({ "script": "return document.readyState", "args": [] });
        loop {
            let state = self.post("execute/sync", script.clone()).await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::timeout("document ready state", timeout));
            }
            sleep(READY_STATE_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn page_source(&self) -> DriverResult<String> {
        self.string_value("source").await
    }

    async fn close(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.command(Method::DELETE, "", None).await.map(|_| ());
        self.closed.store(true, Ordering::SeqCst);
        match &result {
            Ok(()) => info!("Browser session closed"),
            Err(e) => warn!("Closing browser session failed: {}", e),
        }
        result
    }
}
