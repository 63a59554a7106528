//! End-to-end extraction over saved listing snapshots: parse, collect, export
use chrono::NaiveDate;
use order_history_lib::domain::{OrderCollector, TargetSet};
use order_history_lib::infrastructure::config::OutputConfig;
use order_history_lib::infrastructure::export_orders;
use order_history_lib::infrastructure::parsing::{
    HtmlDocumentView, OrderListParser, OrderPageSelectors, PageExtraction, ParseContext,
};

const PAGE_ONE: &str = r#"
<html><body>
<div class="js-yo-main-content">
  <div class="js-order-card">
    <span class="a-color-secondary value">January 15, 2023</span>
    <span class="a-color-price value">$1,299.00</span>
    <span class="yohtmlc-order-id">Order # <bdi>111-4868416-8480200</bdi></span>
    <div class="shipment-top-row"><span class="a-color-secondary">Delivered Jan 18</span></div>
    <div class="js-shipment-info">
      <div class="a-box-group">
        <a class="a-link-normal" href="/gp/product/B0BSHF7WHW">Laptop</a>
        <span class="a-color-price">$1,249.00</span>
      </div>
      <div class="a-box-group">
        <a class="a-link-normal" href="/gp/product/B07PXGQC1Q/ref=ppx_yo_dt">Sleeve</a>
        <span class="a-color-price">$25.00</span>
        <span class="item-view-qty">2</span>
      </div>
    </div>
  </div>
  <div class="js-order-card">
    <span class="a-color-price value">$3.00</span>
  </div>
</div>
</body></html>"#;

const PAGE_TWO: &str = r#"
<html><body>
<div class="js-yo-main-content">
  <div class="js-order-card">
    <span class="a-color-secondary value">January 15, 2023</span>
    <span class="yohtmlc-order-id">111-4868416-8480200</span>
  </div>
  <div class="js-order-card">
    <span class="a-color-secondary value">12/24/2022</span>
    <span class="a-color-price value">$15.49</span>
    <span class="yohtmlc-order-id">110-8215202-5748241</span>
  </div>
</div>
</body></html>"#;

fn extract(parser: &OrderListParser, html: &str, page: u32) -> PageExtraction {
    let ctx = ParseContext::new(page, "https://www.amazon.com").unwrap();
    let document = HtmlDocumentView::parse(html);
    parser.extract_orders(&document.root(), &ctx)
}

#[test]
fn pages_are_concatenated_in_order_without_duplicates() {
    let parser = OrderListParser::new(&OrderPageSelectors::default()).unwrap();
    let mut collector = OrderCollector::new();
    let mut skipped = 0;

    for (page, html) in [PAGE_ONE, PAGE_TWO].into_iter().enumerate() {
        let extraction = extract(&parser, html, u32::try_from(page).unwrap() + 1);
        skipped += extraction.skipped.len();
        for order in extraction.orders {
            collector.accept(order);
        }
    }

    let orders = collector.into_orders();
    let ids: Vec<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, ["111-4868416-8480200", "110-8215202-5748241"]);
    assert_eq!(skipped, 1);

    // First occurrence wins, so the item-bearing record is kept
    assert_eq!(orders[0].items.len(), 2);
    assert_eq!(orders[0].order_total, Some(1299.0));
    assert_eq!(orders[1].order_date.known(), NaiveDate::from_ymd_opt(2022, 12, 24));
}

#[test]
fn target_filter_keeps_only_requested_orders() {
    let parser = OrderListParser::new(&OrderPageSelectors::default()).unwrap();
    let mut targets = TargetSet::new(["110-8215202-5748241".to_string()]);
    let mut collector = OrderCollector::new();

    for html in [PAGE_ONE, PAGE_TWO] {
        for order in extract(&parser, html, 1).orders {
            if targets.resolve(&order.order_id) {
                collector.accept(order);
            }
        }
    }

    assert!(targets.all_resolved());
    assert_eq!(collector.len(), 1);
    assert!(collector.contains("110-8215202-5748241"));
}

#[test]
fn extracted_orders_export_to_both_formats() {
    let parser = OrderListParser::new(&OrderPageSelectors::default()).unwrap();
    let orders = extract(&parser, PAGE_ONE, 1).orders;
    let dir = tempfile::tempdir().unwrap();
    let output = OutputConfig {
        directory: dir.path().join("exports"),
        ..OutputConfig::default()
    };

    let report = export_orders(&orders, &output);
    assert!(report.is_success());

    let mut reader = csv::Reader::from_path(output.csv_path()).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 6 + 2 * 4);
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[0], "111-4868416-8480200");
    assert_eq!(&row[1], "2023-01-15");
    assert_eq!(&row[5], "2");
    assert_eq!(&row[10], "Sleeve");
    assert_eq!(&row[12], "2");
    assert_eq!(&row[13], "B07PXGQC1Q");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.json_path()).unwrap()).unwrap();
    let items = json[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["url"], "https://www.amazon.com/gp/product/B07PXGQC1Q/ref=ppx_yo_dt");
    assert_eq!(json[0]["status"], "Delivered Jan 18");
}
