//! Order export writers
//!
//! Writes the final order set as a flat CSV (one row per order, item columns
//! widened to the largest order) and as a nested JSON array. Each file is
//! written to a temporary file in the destination directory and persisted
//! over the target path, so a failed or interrupted write never leaves a
//! truncated export behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::order::{Order, OrderItem};
use crate::infrastructure::config::OutputConfig;

/// Order-level CSV columns, in output order
pub const CSV_ORDER_COLUMNS: [&str; 6] = [
    "order_id",
    "order_date",
    "order_total",
    "status",
    "shipping_address",
    "item_count",
];

/// Per-item CSV column suffixes; repeated as `item_<n>_<suffix>`
pub const CSV_ITEM_FIELDS: [&str; 4] = ["name", "price", "quantity", "asin"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Outcome of exporting both formats; each is attempted independently
#[derive(Debug)]
pub struct ExportReport {
    pub csv: ExportResult<PathBuf>,
    pub json: ExportResult<PathBuf>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.csv.is_ok() && self.json.is_ok()
    }

    /// Paths that were written
    pub fn written(&self) -> Vec<&Path> {
        [&self.csv, &self.json]
            .into_iter()
            .filter_map(|result| result.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }
}

/// Export `orders` to the CSV and JSON paths of `output`
pub fn export_orders(orders: &[Order], output: &OutputConfig) -> ExportReport {
    let allow_fallback = output.unknown_date_as_extraction_date;

    let csv_path = output.csv_path();
    let csv = write_csv(orders, &csv_path, allow_fallback).map(|()| csv_path);
    match &csv {
        Ok(path) => info!("Wrote {} orders to {}", orders.len(), path.display()),
        Err(e) => error!("CSV export failed: {}", e),
    }

    let json_path = output.json_path();
    let json = write_json(orders, &json_path, allow_fallback).map(|()| json_path);
    match &json {
        Ok(path) => info!("Wrote {} orders to {}", orders.len(), path.display()),
        Err(e) => error!("JSON export failed: {}", e),
    }

    ExportReport { csv, json }
}

/// Header row for the given maximum item count
pub fn csv_header(max_items: usize) -> Vec<String> {
    let mut header: Vec<String> = CSV_ORDER_COLUMNS.iter().map(ToString::to_string).collect();
    for n in 1..=max_items {
        header.extend(CSV_ITEM_FIELDS.iter().map(|field| format!("item_{n}_{field}")));
    }
    header
}

/// One CSV row, padded with empty cells up to `max_items`
pub fn csv_record(order: &Order, max_items: usize, allow_fallback: bool) -> Vec<String> {
    let mut record = vec![
        order.order_id.clone(),
        order.order_date.format(allow_fallback).unwrap_or_default(),
        format_optional(order.order_total),
        order.status.clone().unwrap_or_default(),
        order.shipping_address.clone(),
        order.item_count().to_string(),
    ];
    for n in 0..max_items {
        match order.items.get(n) {
            Some(item) => record.extend([
                item.name.clone(),
                format_optional(item.price),
                item.quantity.to_string(),
                item.product_code.clone().unwrap_or_default(),
            ]),
            None => record.extend(std::iter::repeat_n(String::new(), CSV_ITEM_FIELDS.len())),
        }
    }
    record
}

/// Money cells always carry two decimals
fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Write the flat CSV export
pub fn write_csv(orders: &[Order], path: &Path, allow_fallback: bool) -> ExportResult<()> {
    let max_items = orders.iter().map(Order::item_count).max().unwrap_or(0);

    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(csv_header(max_items))?;
        for order in orders {
            writer.write_record(csv_record(order, max_items, allow_fallback))?;
        }
        writer.flush().map_err(|e| ExportError::io(path, e))
    })
}

/// JSON shape of one order
#[derive(Serialize)]
struct OrderRecord<'a> {
    order_id: &'a str,
    order_date: Option<String>,
    order_total: Option<f64>,
    items: &'a [OrderItem],
    shipping_address: &'a str,
    status: Option<&'a str>,
}

impl<'a> OrderRecord<'a> {
    fn new(order: &'a Order, allow_fallback: bool) -> Self {
        Self {
            order_id: &order.order_id,
            order_date: order.order_date.format(allow_fallback),
            order_total: order.order_total,
            items: &order.items,
            shipping_address: &order.shipping_address,
            status: order.status.as_deref(),
        }
    }
}

/// Write the nested JSON export
pub fn write_json(orders: &[Order], path: &Path, allow_fallback: bool) -> ExportResult<()> {
    let records: Vec<OrderRecord<'_>> = orders
        .iter()
        .map(|order| OrderRecord::new(order, allow_fallback))
        .collect();

    write_atomically(path, |file| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.write_all(b"\n").map_err(|e| ExportError::io(path, e))?;
        writer.flush().map_err(|e| ExportError::io(path, e))
    })
}

/// Run `write` against a temp file next to `path`, then move it into place
fn write_atomically<F>(path: &Path, write: F) -> ExportResult<()>
where
    F: FnOnce(&mut fs::File) -> ExportResult<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(dir, e))?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all().map_err(|e| ExportError::io(path, e))?;
    // Dropping the returned temp file removes it from the directory
    temp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
