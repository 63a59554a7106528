//! Extraction session
//!
//! Owns the browser for one run: opens order history (waiting for a manual
//! sign-in when needed), applies the time filter, runs the traversal, exports
//! the result and finally closes the browser.

#![allow(clippy::uninlined_format_args)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::order_traversal::{OrderTraversal, TraversalError};
use crate::domain::traversal::{TraversalMode, TraversalOutcome};
use crate::infrastructure::browser::{BrowserDriver, DriverError};
use crate::infrastructure::config::{AppConfig, ConfigError};
use crate::infrastructure::export::{ExportReport, export_orders};
use crate::infrastructure::parsing::{OrderListParser, ParsingError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parsing setup error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),

    #[error("Traversal failed: {0}")]
    Traversal(#[from] TraversalError),

    #[error("Timed out after {0:?} waiting for sign-in")]
    LoginTimeout(Duration),
}

/// What one run produced
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub outcome: TraversalOutcome,
    /// `None` when nothing was found and no files were written
    pub export: Option<ExportReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn order_count(&self) -> usize {
        self.outcome.orders.len()
    }
}

/// One extraction run over an exclusively owned browser session
pub struct ExtractionSession<D: BrowserDriver> {
    driver: D,
    parser: OrderListParser,
    config: AppConfig,
    run_id: Uuid,
}

impl<D: BrowserDriver> ExtractionSession<D> {
    pub fn new(driver: D, config: AppConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let parser = OrderListParser::new(&config.extraction.selectors)?;
        Ok(Self {
            driver,
            parser,
            config,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn traversal(&self) -> OrderTraversal<'_, D> {
        OrderTraversal::new(
            &self.driver,
            &self.parser,
            &self.config.site,
            &self.config.extraction,
        )
    }

    /// Load order history, blocking on a manual sign-in if the site asks for one
    pub async fn open_order_history(&self) -> Result<(), SessionError> {
        let orders_url = self.config.site.orders_url();
        info!("Navigating to {}", orders_url);
        self.driver.navigate(&orders_url).await?;

        let title = self.driver.title().await?;
        if title.contains(&self.config.site.sign_in_title) {
            let login_timeout = self.config.extraction.login_timeout();
            info!(
                "Sign-in required: please log in using the browser window (waiting up to {:?})",
                login_timeout
            );
            self.driver
                .wait_for_element(&self.parser.selectors().login_success, login_timeout)
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        SessionError::LoginTimeout(login_timeout)
                    } else {
                        SessionError::Driver(e)
                    }
                })?;
            info!("Sign-in detected");
        } else {
            debug!("Already signed in (page title '{}')", title);
        }

        self.traversal().apply_year_filter().await?;
        Ok(())
    }

    /// Run the configured traversal and export whatever it found
    pub async fn run(&self) -> Result<RunSummary, SessionError> {
        let started_at = Utc::now();
        let mode = TraversalMode::from_targets(&self.config.extraction.target_ids);
        info!("Extraction run {} started ({})", self.run_id, mode.label());

        self.open_order_history().await?;
        let outcome = self.traversal().run(&mode).await?;

        if outcome.skipped_orders > 0 {
            warn!("{} order cards were skipped", outcome.skipped_orders);
        }
        let export = if outcome.orders.is_empty() {
            warn!("No orders were found; nothing exported");
            None
        } else {
            info!("Extracted {} orders in total", outcome.orders.len());
            Some(export_orders(&outcome.orders, &self.config.output))
        };

        let finished_at = Utc::now();
        info!(
            "Extraction run {} finished in {}s",
            self.run_id,
            (finished_at - started_at).num_seconds()
        );
        Ok(RunSummary {
            run_id: self.run_id,
            outcome,
            export,
            started_at,
            finished_at,
        })
    }

    /// Pause briefly so the final page stays visible, then close the browser
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let delay = self.config.browser.close_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.driver.close().await?;
        Ok(())
    }
}
