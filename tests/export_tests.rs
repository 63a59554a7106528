//! Export writer behaviour on disk
use chrono::{NaiveDate, TimeZone, Utc};
use order_history_lib::domain::{Order, OrderDate, OrderItem};
use order_history_lib::infrastructure::config::OutputConfig;
use order_history_lib::infrastructure::export_orders;
use std::fs;

fn orders() -> Vec<Order> {
    vec![
        Order::new(
            "111-4868416-8480200",
            OrderDate::from(NaiveDate::from_ymd_opt(2023, 3, 5).unwrap()),
        )
        .with_total(74.98)
        .with_items(vec![
            OrderItem::named("Echo Dot").with_price(49.99).with_product_code("B08N5WRWNW"),
            OrderItem::named("Smart Plug").with_price(24.99).with_quantity(2),
        ]),
        Order::new(
            "110-8215202-5748241",
            OrderDate::Unknown {
                extracted_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            },
        ),
    ]
}

fn output_in(dir: &std::path::Path) -> OutputConfig {
    OutputConfig {
        directory: dir.to_path_buf(),
        ..OutputConfig::default()
    }
}

#[test]
fn csv_rows_are_padded_to_widest_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(dir.path());
    assert!(export_orders(&orders(), &output).is_success());

    let content = fs::read_to_string(output.csv_path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "order_id,order_date,order_total,status,shipping_address,item_count,\
         item_1_name,item_1_price,item_1_quantity,item_1_asin,\
         item_2_name,item_2_price,item_2_quantity,item_2_asin"
    );
    assert_eq!(
        lines[1],
        "111-4868416-8480200,2023-03-05,74.98,,,2,Echo Dot,49.99,1,B08N5WRWNW,Smart Plug,24.99,2,"
    );
    assert_eq!(lines[2], "110-8215202-5748241,,,,,0,,,,,,,,");
}

#[test]
fn json_keeps_record_order_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(dir.path());
    export_orders(&orders(), &output);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.json_path()).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["order_id"], "111-4868416-8480200");
    assert_eq!(records[0]["order_date"], "2023-03-05");
    assert_eq!(records[0]["items"][1]["quantity"], 2);
    assert!(records[1]["order_date"].is_null());
    assert!(records[1]["order_total"].is_null());
    assert_eq!(records[1]["items"], serde_json::json!([]));
}

#[test]
fn legacy_option_writes_extraction_date_for_unknown_dates() {
    let dir = tempfile::tempdir().unwrap();
    let output = OutputConfig {
        unknown_date_as_extraction_date: true,
        ..output_in(dir.path())
    };
    export_orders(&orders(), &output);

    let content = fs::read_to_string(output.csv_path()).unwrap();
    assert!(content.lines().nth(2).unwrap().starts_with("110-8215202-5748241,2024-06-01,"));
}

#[test]
fn json_failure_does_not_block_csv() {
    let dir = tempfile::tempdir().unwrap();
    let output = OutputConfig {
        json_filename: "taken".to_string(),
        ..output_in(dir.path())
    };
    fs::create_dir(dir.path().join("taken")).unwrap();
    fs::write(dir.path().join("taken").join("keep.txt"), "x").unwrap();

    let report = export_orders(&orders(), &output);
    assert!(report.csv.is_ok());
    assert!(report.json.is_err());
    assert!(!report.is_success());
    assert_eq!(report.written(), vec![output.csv_path().as_path()]);

    // No temp files left next to the exports
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 2);
}

#[test]
fn rerun_overwrites_previous_export() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_in(dir.path());
    export_orders(&orders(), &output);
    export_orders(&orders()[..1], &output);

    let content = fs::read_to_string(output.csv_path()).unwrap();
    assert_eq!(content.lines().count(), 2);
}
