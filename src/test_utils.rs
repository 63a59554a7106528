//! Test utilities for the order history extractor
//!
//! Provides a scripted in-memory `BrowserDriver` that serves fixture pages
//! and reacts to pagination, search and sign-in the way the real site does,
//! plus builders for fixture markup.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::infrastructure::browser::{BrowserDriver, DriverError, DriverResult, ElementHandle};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::parsing::OrderPageSelectors;

/// Configuration with short timeouts and no close delay
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.extraction.timeout_ms = 1_000;
    config.extraction.login_timeout_ms = 5_000;
    config.extraction.search_delay_ms = 100;
    config.browser.close_delay_ms = 0;
    config.logging.file_output = false;
    config
}

/// One order card with a single item
pub fn order_card(order_id: &str) -> String {
    format!(
        r#"<div class="js-order-card">
  <span class="a-color-secondary value">March 5, 2023</span>
  <span class="a-color-price value">$24.99</span>
  <span class="yohtmlc-order-id">Order # <bdi>{order_id}</bdi></span>
  <div class="shipment-top-row"><span class="a-color-secondary">Delivered</span></div>
  <div class="js-shipment-info">
    <div class="a-box-group">
      <a class="a-link-normal" href="/gp/product/B08N5WRWNW">Item of {order_id}</a>
      <span class="a-color-price">$24.99</span>
    </div>
  </div>
</div>"#
    )
}

/// Listing page with one card per id, search form, time filter and pagination
pub fn listing_page(order_ids: &[&str], has_next: bool, next_disabled: bool) -> String {
    let cards: String = order_ids.iter().map(|id| order_card(id)).collect();
    let pagination = match (has_next, next_disabled) {
        (false, _) => String::new(),
        (true, false) => r#"<ul class="a-pagination"><li class="a-last"><a href="?startIndex=10">Next</a></li></ul>"#.to_string(),
        (true, true) => r#"<ul class="a-pagination"><li class="a-last"><a aria-disabled="true">Next</a></li></ul>"#.to_string(),
    };
    format!(
        r#"<html><head><title>Your Orders</title></head><body>
<a id="nav-link-accountList">Account</a>
<form action="/your-orders/search">
  <input id="searchOrdersInput" type="search" name="search">
  <input type="submit" value="Search Orders">
</form>
<select name="timeFilter">
  <option value="last30">last 30 days</option>
  <option value="year-2023">2023</option>
  <option value="year-2022">2022</option>
</select>
<div class="js-yo-main-content">{cards}</div>
{pagination}
</body></html>"#
    )
}

const SIGN_IN_PAGE: &str =
    r#"<html><head><title>Amazon Sign-In</title></head><body><form name="signIn"></form></body></html>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    SignIn,
    Listing(usize),
    SearchResults(String),
}

#[derive(Debug)]
struct BrowserState {
    location: Location,
    /// Polls for the sign-in marker left before the user "signs in"
    login_polls_left: Option<usize>,
    handles: HashMap<String, (String, usize)>,
    next_handle: usize,
    pending_query: String,
    searches: Vec<String>,
    selected_options: Vec<String>,
    navigations: usize,
    close_calls: usize,
}

/// In-memory browser over fixture listing pages
#[derive(Debug)]
pub struct ScriptedBrowser {
    selectors: OrderPageSelectors,
    pages: Vec<String>,
    search_results: HashMap<String, String>,
    state: Mutex<BrowserState>,
}

impl ScriptedBrowser {
    /// Browser already signed in, showing the first of `pages`
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            selectors: OrderPageSelectors::default(),
            pages,
            search_results: HashMap::new(),
            state: Mutex::new(BrowserState {
                location: Location::Listing(0),
                login_polls_left: None,
                handles: HashMap::new(),
                next_handle: 0,
                pending_query: String::new(),
                searches: Vec::new(),
                selected_options: Vec::new(),
                navigations: 0,
                close_calls: 0,
            }),
        }
    }

    /// Result page served after searching for `query`; other queries find nothing
    pub fn with_search_results(mut self, query: &str, page: String) -> Self {
        self.search_results.insert(query.to_string(), page);
        self
    }

    /// Start on the sign-in page. With `Some(n)` the user finishes signing in
    /// after `n` polls for the signed-in marker; with `None` never.
    pub fn signed_out(self, signs_in_after: Option<usize>) -> Self {
        {
            let mut state = self.lock();
            state.location = Location::SignIn;
            state.login_polls_left = signs_in_after;
        }
        self
    }

    /// Queries submitted through the search form, in order
    pub fn searches(&self) -> Vec<String> {
        self.lock().searches.clone()
    }

    pub fn selected_options(&self) -> Vec<String> {
        self.lock().selected_options.clone()
    }

    pub fn navigations(&self) -> usize {
        self.lock().navigations
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn current_html(&self, location: &Location) -> String {
        match location {
            Location::SignIn => SIGN_IN_PAGE.to_string(),
            Location::Listing(index) => self
                .pages
                .get(*index)
                .cloned()
                .unwrap_or_else(|| "<html><body></body></html>".to_string()),
            Location::SearchResults(query) => self
                .search_results
                .get(query)
                .cloned()
                .unwrap_or_else(|| listing_page(&[], false, false)),
        }
    }

    fn compile(selector: &str) -> DriverResult<Selector> {
        Selector::parse(selector).map_err(|e| DriverError::Protocol {
            error: "invalid selector".to_string(),
            message: e.to_string(),
        })
    }

    fn count_matches(&self, state: &BrowserState, selector: &str) -> DriverResult<usize> {
        let compiled = Self::compile(selector)?;
        let document = Html::parse_document(&self.current_html(&state.location));
        Ok(document.select(&compiled).count())
    }

    fn issue_handle(state: &mut BrowserState, selector: &str, index: usize) -> ElementHandle {
        state.next_handle += 1;
        let id = format!("el-{}", state.next_handle);
        state.handles.insert(id.clone(), (selector.to_string(), index));
        ElementHandle(id)
    }

    fn resolve_handle(state: &BrowserState, element: &ElementHandle) -> DriverResult<(String, usize)> {
        state
            .handles
            .get(element.id())
            .cloned()
            .ok_or_else(|| DriverError::NoSuchElement(element.id().to_string()))
    }

    fn query_all_sync(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.location == Location::SignIn && selector == self.selectors.login_success {
            match state.login_polls_left.as_mut() {
                Some(0) => state.location = Location::Listing(0),
                Some(left) => *left -= 1,
                None => {}
            }
        }
        let count = self.count_matches(state, selector)?;
        Ok((0..count)
            .map(|index| Self::issue_handle(state, selector, index))
            .collect())
    }

    fn with_element<T>(
        &self,
        element: &ElementHandle,
        read: impl FnOnce(scraper::ElementRef<'_>) -> T,
    ) -> DriverResult<T> {
        let state = self.lock();
        let (selector, index) = Self::resolve_handle(&state, element)?;
        let compiled = Self::compile(&selector)?;
        let document = Html::parse_document(&self.current_html(&state.location));
        document
            .select(&compiled)
            .nth(index)
            .map(read)
            .ok_or_else(|| DriverError::NoSuchElement(selector.clone()))
    }

    fn click_sync(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.lock();
        let (selector, _) = Self::resolve_handle(&state, element)?;
        if selector == self.selectors.pagination_next {
            if let Location::Listing(index) = state.location {
                state.location = Location::Listing(index + 1);
            }
        } else if selector == self.selectors.search_submit {
            let query = state.pending_query.clone();
            state.searches.push(query.clone());
            state.location = Location::SearchResults(query);
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn navigate(&self, _url: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.navigations += 1;
        state.pending_query.clear();
        if state.location != Location::SignIn {
            state.location = Location::Listing(0);
        }
        Ok(())
    }

    async fn title(&self) -> DriverResult<String> {
        let state = self.lock();
        Ok(match state.location {
            Location::SignIn => "Amazon Sign-In".to_string(),
            _ => "Your Orders".to_string(),
        })
    }

    async fn query_selector(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        Ok(self.query_all_sync(selector)?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        self.query_all_sync(selector)
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.with_element(element, |el| el.value().attr(name).map(str::to_string))
    }

    async fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        self.with_element(element, |el| el.text().collect::<String>())
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        self.click_sync(element)
    }

    async fn fill_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut state = self.lock();
        let (selector, _) = Self::resolve_handle(&state, element)?;
        if selector == self.selectors.search_input {
            state.pending_query = text.to_string();
        }
        Ok(())
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> DriverResult<()> {
        let mut state = self.lock();
        Self::resolve_handle(&state, element)?;
        state.selected_options.push(value.to_string());
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    async fn page_source(&self) -> DriverResult<String> {
        let state = self.lock();
        Ok(self.current_html(&state.location))
    }

    async fn close(&self) -> DriverResult<()> {
        self.lock().close_calls += 1;
        Ok(())
    }
}
