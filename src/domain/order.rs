//! Order entities extracted from order-history pages
//!
//! `Order` and `OrderItem` are created by the page extractor, fully populated
//! before they are accumulated, and never mutated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used by every export
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single line item within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: Option<f64>,
    pub quantity: u32,
    /// 10-character catalog identifier embedded in the item link
    #[serde(rename = "asin")]
    pub product_code: Option<String>,
    #[serde(rename = "url")]
    pub source_url: Option<String>,
}

impl OrderItem {
    /// Item with only a name; quantity defaults to 1
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
            quantity: 1,
            product_code: None,
            source_url: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn with_product_code(mut self, code: impl Into<String>) -> Self {
        self.product_code = Some(code.into());
        self
    }
}

/// Order date as found on the page.
///
/// `Unknown` marks a card where no parseable date was found. It keeps the
/// extraction timestamp so a caller can still fall back to it explicitly, but
/// it is never confused with a genuine same-day order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDate {
    Known(NaiveDate),
    Unknown { extracted_at: DateTime<Utc> },
}

impl OrderDate {
    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Known date, or the extraction date when `allow_fallback` is set
    pub fn resolve(&self, allow_fallback: bool) -> Option<NaiveDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unknown { extracted_at } if allow_fallback => Some(extracted_at.date_naive()),
            Self::Unknown { .. } => None,
        }
    }

    /// `YYYY-MM-DD` rendering, see [`OrderDate::resolve`]
    pub fn format(&self, allow_fallback: bool) -> Option<String> {
        self.resolve(allow_fallback)
            .map(|date| date.format(EXPORT_DATE_FORMAT).to_string())
    }
}

impl From<NaiveDate> for OrderDate {
    fn from(date: NaiveDate) -> Self {
        Self::Known(date)
    }
}

/// A complete order with its items in page order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Canonical `\d+-\d+-\d+` form when recognizable
    pub order_id: String,
    pub order_date: OrderDate,
    pub order_total: Option<f64>,
    pub items: Vec<OrderItem>,
    pub status: Option<String>,
    /// Always empty: shipping addresses are deliberately not extracted
    pub shipping_address: String,
}

impl Order {
    pub fn new(order_id: impl Into<String>, order_date: OrderDate) -> Self {
        Self {
            order_id: order_id.into(),
            order_date,
            order_total: None,
            items: Vec::new(),
            status: None,
            shipping_address: String::new(),
        }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.order_total = Some(total);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.items = items;
        self
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
