//! Order traversal controller
//!
//! Drives the browser through order-history listing pages (full scan) or
//! through per-order searches followed by a filtered fallback scan (targeted
//! search), feeding each page snapshot to the order parser.
//!
//! Termination and failure rules:
//! - a scan stops at the page ceiling, at a missing or disabled "next"
//!   control, or when advancing to the next page fails
//! - failing to read the very first page is an error; any later failure
//!   ends the scan and keeps what was collected
//! - in targeted mode a failed search or fallback scan is logged and the
//!   hits collected so far are kept

#![allow(clippy::uninlined_format_args)]

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::order::Order;
use crate::domain::traversal::{
    OrderCollector, StopReason, TargetSet, TraversalMode, TraversalOutcome, TraversalPhase,
};
use crate::infrastructure::browser::{BrowserDriver, DriverError, ElementHandle};
use crate::infrastructure::config::{ExtractionConfig, SiteConfig};
use crate::infrastructure::parsing::field_parsers::extract_order_id;
use crate::infrastructure::parsing::{
    HtmlDocumentView, OrderListParser, PageExtraction, ParseContext, ParsingError,
};

#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),

    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),
}

/// State of the "next page" control
#[derive(Debug)]
enum NextPage {
    Available(ElementHandle),
    Missing,
    Disabled,
}

/// Result of one multi-page scan
#[derive(Debug)]
struct ScanReport {
    pages_visited: u32,
    stop_reason: StopReason,
    skipped_orders: usize,
}

/// Traversal controller over a borrowed browser session
pub struct OrderTraversal<'a, D: BrowserDriver + ?Sized> {
    driver: &'a D,
    parser: &'a OrderListParser,
    site: &'a SiteConfig,
    extraction: &'a ExtractionConfig,
}

impl<'a, D: BrowserDriver + ?Sized> OrderTraversal<'a, D> {
    pub fn new(
        driver: &'a D,
        parser: &'a OrderListParser,
        site: &'a SiteConfig,
        extraction: &'a ExtractionConfig,
    ) -> Self {
        Self {
            driver,
            parser,
            site,
            extraction,
        }
    }

    /// Run the traversal for `mode`
    pub async fn run(&self, mode: &TraversalMode) -> Result<TraversalOutcome, TraversalError> {
        match mode {
            TraversalMode::FullScan => self.full_scan().await,
            TraversalMode::TargetedSearch { targets } => self.targeted_search(targets).await,
        }
    }

    /// Walk listing pages starting from the page currently loaded
    pub async fn full_scan(&self) -> Result<TraversalOutcome, TraversalError> {
        info!("Starting full scan (max pages: {:?})", self.extraction.max_pages);
        let mut collector = OrderCollector::new();
        let report = self
            .scan_pages(&mut collector, None, self.extraction.max_pages)
            .await?;
        self.enter(&TraversalPhase::Done);

        info!(
            "Full scan finished: {} orders from {} pages ({})",
            collector.len(),
            report.pages_visited,
            report.stop_reason
        );
        Ok(TraversalOutcome {
            mode: TraversalMode::FullScan.label(),
            orders: collector.into_orders(),
            pages_visited: report.pages_visited,
            stop_reason: report.stop_reason,
            unresolved_targets: Vec::new(),
            skipped_orders: report.skipped_orders,
        })
    }

    /// Search for each target, then scan for whatever the searches missed
    pub async fn targeted_search(&self, targets: &[String]) -> Result<TraversalOutcome, TraversalError> {
        let mut targets = TargetSet::new(targets.iter().map(|t| extract_order_id(t)));
        info!("Starting targeted search for {} orders", targets.len());

        let mut collector = OrderCollector::new();
        let mut pages_visited = 0;
        let mut skipped_orders = 0;
        let mut queries_issued = 0;

        for target in targets.remaining() {
            if !targets.is_remaining(&target) {
                continue;
            }
            self.enter(&TraversalPhase::Searching {
                remaining: targets.remaining_count(),
            });
            if queries_issued > 0 {
                sleep(self.extraction.search_delay()).await;
            }
            queries_issued += 1;

            match self.search_for(&target, &mut collector, &mut targets).await {
                Ok(report) => {
                    pages_visited += report.pages_visited;
                    skipped_orders += report.skipped_orders;
                    if targets.is_remaining(&target) {
                        info!("Search did not find order {}", target);
                    } else {
                        info!("Found order {} via search", target);
                    }
                }
                Err(e) => warn!("Search for order {} failed: {}", target, e),
            }
        }

        let stop_reason = if targets.all_resolved() {
            StopReason::SearchComplete
        } else {
            self.enter(&TraversalPhase::FallbackScanning {
                remaining: targets.remaining_count(),
            });
            info!(
                "{} orders not found by search; scanning order history",
                targets.remaining_count()
            );
            match self.fallback_scan(&mut collector, &mut targets).await {
                Ok(report) => {
                    pages_visited += report.pages_visited;
                    skipped_orders += report.skipped_orders;
                    report.stop_reason
                }
                Err(e) => {
                    warn!("Fallback scan failed: {}", e);
                    StopReason::NavigationFailed(e.to_string())
                }
            }
        };
        self.enter(&TraversalPhase::Done);

        let unresolved_targets = targets.remaining();
        if !unresolved_targets.is_empty() {
            warn!("Orders not found: {}", unresolved_targets.join(", "));
        }
        info!(
            "Targeted search finished: {} of {} orders found",
            collector.len(),
            targets.len()
        );

        Ok(TraversalOutcome {
            mode: TraversalMode::TargetedSearch { targets: Vec::new() }.label(),
            orders: collector.into_orders(),
            pages_visited,
            stop_reason,
            unresolved_targets,
            skipped_orders,
        })
    }

    /// Select the configured time range in the listing's dropdown. Returns
    /// whether a filter was applied; a missing dropdown is not an error.
    pub async fn apply_year_filter(&self) -> Result<bool, DriverError> {
        let Some(value) = self.extraction.year_filter_value() else {
            return Ok(false);
        };
        let selectors = self.parser.selectors();

        let Some(dropdown) = self.driver.query_selector(&selectors.year_filter).await? else {
            warn!("Time filter dropdown not found; continuing without year filter");
            return Ok(false);
        };
        self.driver.select_option(&dropdown, &value).await?;
        self.driver
            .wait_for_network_idle(self.extraction.timeout())
            .await?;
        self.driver
            .wait_for_element(&selectors.orders_container, self.extraction.timeout())
            .await?;
        info!("Applied time filter {}", value);
        Ok(true)
    }

    /// Wait for the listing, snapshot it and extract its orders
    pub async fn extract_current_page(&self, page_number: u32) -> Result<PageExtraction, TraversalError> {
        self.driver
            .wait_for_element(&self.parser.selectors().orders_container, self.extraction.timeout())
            .await?;
        let source = self.driver.page_source().await?;
        self.parse_snapshot(&source, page_number)
    }

    fn parse_snapshot(&self, source: &str, page_number: u32) -> Result<PageExtraction, TraversalError> {
        let ctx = ParseContext::new(page_number, &self.site.base_url())?;
        let document = HtmlDocumentView::parse(source);
        Ok(self.parser.extract_orders(&document.root(), &ctx))
    }

    async fn search_for(
        &self,
        target: &str,
        collector: &mut OrderCollector,
        targets: &mut TargetSet,
    ) -> Result<ScanReport, TraversalError> {
        let selectors = self.parser.selectors();
        let timeout = self.extraction.timeout();

        self.driver.navigate(&self.site.orders_url()).await?;
        let input = self
            .driver
            .wait_for_element(&selectors.search_input, timeout)
            .await?;
        self.driver.fill_text(&input, target).await?;
        let submit = self
            .driver
            .query_selector(&selectors.search_submit)
            .await?
            .ok_or_else(|| DriverError::NoSuchElement(selectors.search_submit.clone()))?;
        self.driver.click(&submit).await?;
        self.driver.wait_for_network_idle(timeout).await?;

        self.scan_pages(collector, Some(targets), Some(self.extraction.search_result_pages))
            .await
    }

    async fn fallback_scan(
        &self,
        collector: &mut OrderCollector,
        targets: &mut TargetSet,
    ) -> Result<ScanReport, TraversalError> {
        self.driver.navigate(&self.site.orders_url()).await?;
        self.driver
            .wait_for_element(&self.parser.selectors().orders_container, self.extraction.timeout())
            .await?;
        self.apply_year_filter().await?;
        self.scan_pages(collector, Some(targets), self.extraction.max_pages)
            .await
    }

    /// Extract pages until a stop condition. With `targets`, only orders that
    /// resolve a remaining target are kept and the scan ends once none remain.
    async fn scan_pages(
        &self,
        collector: &mut OrderCollector,
        mut targets: Option<&mut TargetSet>,
        max_pages: Option<u32>,
    ) -> Result<ScanReport, TraversalError> {
        let mut pages_visited = 0;
        let mut skipped_orders = 0;

        let stop_reason = loop {
            let page = pages_visited + 1;
            self.enter(&TraversalPhase::Scanning { page });

            let extraction = match self.extract_current_page(page).await {
                Ok(extraction) => extraction,
                Err(e) if pages_visited == 0 => return Err(e),
                Err(e) => {
                    warn!("Failed to read page {}: {}", page, e);
                    break StopReason::NavigationFailed(e.to_string());
                }
            };
            pages_visited = page;
            skipped_orders += extraction.skipped.len();
            let added = self.collect_orders(extraction.orders, collector, targets.as_deref_mut());
            info!("Page {}: {} new orders ({} total)", page, added, collector.len());

            if targets.as_deref().is_some_and(TargetSet::all_resolved) {
                break StopReason::AllTargetsResolved;
            }
            if let Some(limit) = max_pages {
                if page >= limit {
                    info!("Reached maximum page limit ({})", limit);
                    break StopReason::PageLimit(limit);
                }
            }

            match self.next_page().await {
                Ok(NextPage::Available(next)) => {
                    if let Err(e) = self.advance(&next).await {
                        warn!("Failed to navigate to page {}: {}", page + 1, e);
                        break StopReason::NavigationFailed(e.to_string());
                    }
                }
                Ok(NextPage::Missing) => break StopReason::NoNextPage,
                Ok(NextPage::Disabled) => break StopReason::NextDisabled,
                Err(e) => {
                    warn!("Failed to inspect pagination on page {}: {}", page, e);
                    break StopReason::NavigationFailed(e.to_string());
                }
            }
        };
        debug!("Scan stopped after {} pages: {}", pages_visited, stop_reason);

        Ok(ScanReport {
            pages_visited,
            stop_reason,
            skipped_orders,
        })
    }

    /// Add page orders to the collector; returns how many were new
    fn collect_orders(
        &self,
        orders: Vec<Order>,
        collector: &mut OrderCollector,
        mut targets: Option<&mut TargetSet>,
    ) -> usize {
        let mut added = 0;
        for order in orders {
            if let Some(targets) = targets.as_deref_mut() {
                if !targets.resolve(&order.order_id) {
                    continue;
                }
            }
            let order_id = order.order_id.clone();
            if collector.accept(order) {
                added += 1;
            } else {
                debug!("Duplicate order {} ignored", order_id);
            }
        }
        added
    }

    async fn next_page(&self) -> Result<NextPage, DriverError> {
        let Some(next) = self
            .driver
            .query_selector(&self.parser.selectors().pagination_next)
            .await?
        else {
            return Ok(NextPage::Missing);
        };

        let aria_disabled = self.driver.attribute(&next, "aria-disabled").await?;
        let disabled = self.driver.attribute(&next, "disabled").await?;
        let class = self.driver.attribute(&next, "class").await?;
        let is_disabled = aria_disabled.as_deref() == Some("true")
            || disabled.is_some_and(|d| d != "false")
            || class.is_some_and(|c| c.split_whitespace().any(|c| c == "a-disabled"));

        Ok(if is_disabled {
            NextPage::Disabled
        } else {
            NextPage::Available(next)
        })
    }

    async fn advance(&self, next: &ElementHandle) -> Result<(), DriverError> {
        let timeout = self.extraction.timeout();
        self.driver.click(next).await?;
        self.driver.wait_for_network_idle(timeout).await?;
        self.driver
            .wait_for_element(&self.parser.selectors().orders_container, timeout)
            .await?;
        Ok(())
    }

    fn enter(&self, phase: &TraversalPhase) {
        debug!("Traversal phase: {}", phase);
    }
}
