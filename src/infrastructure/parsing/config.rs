//! Selector configuration for order-page extraction
//!
//! Centralized CSS selectors for the order-history markup. Every field is a
//! single selector string; comma-separated selector groups are allowed.

use serde::{Deserialize, Serialize};

/// CSS selectors for order-history and search-result pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPageSelectors {
    /// Listing container; its presence means the page has rendered
    pub orders_container: String,

    /// One element per order
    pub order_card: String,

    pub order_id: String,

    /// Candidate date elements, first parseable one wins
    pub order_date: String,

    /// Candidate total elements, first one carrying a price wins
    pub order_total: String,

    pub order_status: String,

    /// One element per shipment within an order card
    pub shipment_container: String,

    /// Item element inside a shipment container
    pub item_element: String,

    /// Item link; its text is the item name
    pub item_name: String,

    pub item_price: String,

    pub item_quantity: String,

    /// "Next page" control
    pub pagination_next: String,

    /// Only present once the account is signed in
    pub login_success: String,

    /// Time-range dropdown on the listing page
    pub year_filter: String,

    pub search_input: String,

    pub search_submit: String,
}

impl Default for OrderPageSelectors {
    fn default() -> Self {
        Self {
            orders_container: ".js-yo-main-content".to_string(),
            order_card: ".js-order-card".to_string(),
            order_id: ".yohtmlc-order-id".to_string(),
            order_date: ".a-color-secondary.value".to_string(),
            order_total: ".a-color-price.value".to_string(),
            order_status: ".shipment-top-row .a-color-secondary".to_string(),
            shipment_container: ".js-shipment-info, .a-box-group.a-spacing-base.js-shipment"
                .to_string(),
            item_element: "div.a-box-group".to_string(),
            item_name: ".a-link-normal[href*='/gp/product/']".to_string(),
            item_price: ".a-color-price".to_string(),
            item_quantity: ".item-view-qty".to_string(),
            pagination_next: ".a-pagination .a-last a".to_string(),
            login_success: "#nav-link-accountList".to_string(),
            year_filter: "select[name='timeFilter']".to_string(),
            search_input: "#searchOrdersInput".to_string(),
            search_submit: "form[action*='search'] input[type='submit']".to_string(),
        }
    }
}

impl OrderPageSelectors {
    /// `(field name, selector)` pairs, used for validation and diagnostics
    pub fn entries(&self) -> [(&'static str, &str); 16] {
        [
            ("orders_container", self.orders_container.as_str()),
            ("order_card", self.order_card.as_str()),
            ("order_id", self.order_id.as_str()),
            ("order_date", self.order_date.as_str()),
            ("order_total", self.order_total.as_str()),
            ("order_status", self.order_status.as_str()),
            ("shipment_container", self.shipment_container.as_str()),
            ("item_element", self.item_element.as_str()),
            ("item_name", self.item_name.as_str()),
            ("item_price", self.item_price.as_str()),
            ("item_quantity", self.item_quantity.as_str()),
            ("pagination_next", self.pagination_next.as_str()),
            ("login_success", self.login_success.as_str()),
            ("year_filter", self.year_filter.as_str()),
            ("search_input", self.search_input.as_str()),
            ("search_submit", self.search_submit.as_str()),
        ]
    }
}
