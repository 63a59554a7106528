//! Order list parser
//!
//! Turns order cards on a listing or search-result snapshot into `Order`
//! records. Every field has a fallback; the only per-card failure is a
//! missing order id, which skips that card and nothing else.

use scraper::Selector;
use tracing::{debug, warn};

use super::config::OrderPageSelectors;
use super::context::ParseContext;
use super::error::{OrderSkip, ParsingError, ParsingResult, SkippedOrder};
use super::field_parsers::{
    clean_text, extract_date, extract_order_id, extract_price, extract_product_code,
    extract_quantity, find_month_name_date,
};
use super::page_view::PageView;
use crate::domain::order::{Order, OrderDate, OrderItem};

/// Orders extracted from one page snapshot
#[derive(Debug, Default)]
pub struct PageExtraction {
    /// Successfully extracted orders in card order
    pub orders: Vec<Order>,
    pub skipped: Vec<SkippedOrder>,
}

/// Parser for order-history listing and search-result pages
#[derive(Debug)]
pub struct OrderListParser {
    selectors: OrderPageSelectors,
    order_card: Selector,
    order_id: Selector,
    order_date: Selector,
    order_total: Selector,
    order_status: Selector,
    shipment_container: Selector,
    item_element: Selector,
    item_name: Selector,
    item_price: Selector,
    item_quantity: Selector,
}

impl OrderListParser {
    /// Build a parser, validating every configured selector up front
    pub fn new(selectors: &OrderPageSelectors) -> ParsingResult<Self> {
        for (field, selector) in selectors.entries() {
            Self::compile(field, selector)?;
        }
        debug!("Compiled {} order page selectors", selectors.entries().len());

        Ok(Self {
            order_card: Self::compile("order_card", &selectors.order_card)?,
            order_id: Self::compile("order_id", &selectors.order_id)?,
            order_date: Self::compile("order_date", &selectors.order_date)?,
            order_total: Self::compile("order_total", &selectors.order_total)?,
            order_status: Self::compile("order_status", &selectors.order_status)?,
            shipment_container: Self::compile("shipment_container", &selectors.shipment_container)?,
            item_element: Self::compile("item_element", &selectors.item_element)?,
            item_name: Self::compile("item_name", &selectors.item_name)?,
            item_price: Self::compile("item_price", &selectors.item_price)?,
            item_quantity: Self::compile("item_quantity", &selectors.item_quantity)?,
            selectors: selectors.clone(),
        })
    }

    fn compile(field: &str, selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| {
            warn!("Failed to compile selector '{}' for {}: {}", selector, field, e);
            ParsingError::invalid_selector(field, selector, e)
        })
    }

    /// Raw selector strings, for the browser-side queries
    pub fn selectors(&self) -> &OrderPageSelectors {
        &self.selectors
    }

    /// Extract every order card under `root`. Skipped cards are logged and
    /// recorded; they never abort the page.
    pub fn extract_orders<V: PageView>(&self, root: &V, ctx: &ParseContext) -> PageExtraction {
        let cards = root.find_all(&self.order_card);
        debug!("Found {} order cards on page {}", cards.len(), ctx.page_number);

        let mut extraction = PageExtraction::default();
        for (index, card) in cards.iter().enumerate() {
            match self.extract_order(card, ctx) {
                Ok(order) => extraction.orders.push(order),
                Err(reason) => {
                    warn!(
                        "Skipping order card {} on page {}: {}",
                        index, ctx.page_number, reason
                    );
                    extraction.skipped.push(SkippedOrder { index, reason });
                }
            }
        }
        extraction
    }

    /// Extract one order card
    pub fn extract_order<V: PageView>(&self, card: &V, ctx: &ParseContext) -> Result<Order, OrderSkip> {
        let id_element = card.find_one(&self.order_id).ok_or(OrderSkip::MissingOrderId)?;
        let raw_id = clean_text(&id_element.text());
        if raw_id.is_empty() {
            return Err(OrderSkip::EmptyOrderId);
        }
        let order_id = extract_order_id(&raw_id);

        let order_date = self.extract_order_date(card, &order_id, ctx);

        let mut order = Order::new(order_id, order_date).with_items(self.extract_items(card, ctx));

        if let Some(total) = card
            .find_all(&self.order_total)
            .iter()
            .find_map(|el| extract_price(&el.text()))
        {
            order = order.with_total(total);
        }

        if let Some(status) = card
            .find_one(&self.order_status)
            .map(|el| clean_text(&el.text()))
            .filter(|s| !s.is_empty())
        {
            order = order.with_status(status);
        }

        Ok(order)
    }

    /// Date element, then a month-name date anywhere in the card, then `Unknown`
    fn extract_order_date<V: PageView>(&self, card: &V, order_id: &str, ctx: &ParseContext) -> OrderDate {
        if let Some(date) = card
            .find_all(&self.order_date)
            .iter()
            .find_map(|el| extract_date(&el.text()))
        {
            return OrderDate::Known(date);
        }

        let card_text = clean_text(&card.text());
        if let Some(date) = find_month_name_date(&card_text).and_then(extract_date) {
            debug!("Order {} date recovered from card text", order_id);
            return OrderDate::Known(date);
        }

        warn!(
            "No parseable date for order {} on page {}; recording as unknown",
            order_id, ctx.page_number
        );
        OrderDate::Unknown {
            extracted_at: ctx.extracted_at,
        }
    }

    fn extract_items<V: PageView>(&self, card: &V, ctx: &ParseContext) -> Vec<OrderItem> {
        let mut items = Vec::new();
        for container in card.find_all(&self.shipment_container) {
            let mut elements = container.find_all(&self.item_element);
            if elements.is_empty() {
                elements.push(container);
            }
            items.extend(
                elements
                    .iter()
                    .map(|element| self.extract_item(element, ctx))
                    .filter(|item| !item.name.is_empty()),
            );
        }
        items
    }

    /// Extract a single item. Always returns an item; the name may be empty
    /// when the element carries no product link.
    pub fn extract_item<V: PageView>(&self, element: &V, ctx: &ParseContext) -> OrderItem {
        let (name, href) = match element.find_one(&self.item_name) {
            Some(link) => (clean_text(&link.text()), link.attribute("href")),
            None => (String::new(), None),
        };

        let mut item = OrderItem::named(name);
        if let Some(href) = href.as_deref().filter(|h| !h.is_empty()) {
            item.product_code = extract_product_code(href);
            item.source_url = ctx.resolve_url(href);
        }
        item.price = element
            .find_one(&self.item_price)
            .and_then(|el| extract_price(&el.text()));
        item.quantity = element
            .find_one(&self.item_quantity)
            .map_or(1, |el| extract_quantity(&el.text()));
        item
    }
}
