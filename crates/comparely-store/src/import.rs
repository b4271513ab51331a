//! Bulk device import from CSV.
//!
//! Expected header (extra columns are ignored, missing optional ones are
//! treated as blank):
//!
//! ```text
//! name,brand,category_id,cpu,gpu,ram,storage,camera,battery,screen,release_year,price,image_url,source_data
//! ```
//!
//! DuckDB reads the file with every column as text; normalisation happens
//! here so that one bad row never aborts the whole import.

use std::path::Path;

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use comparely_core::{NewDevice, parse_price};
use tracing::{info, warn};

use crate::{DuckStore, StoreError};

/// Release year assumed when the column is blank.
pub const DEFAULT_RELEASE_YEAR: i32 = 2023;

const REQUIRED: &[&str] = &["name", "brand", "category_id", "price"];

/// Placeholder stored for blank spec fields.
const NOT_AVAILABLE: &str = "N/A";

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub inserted: usize,
    pub failed: Vec<RowError>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.inserted + self.failed.len()
    }
}

/// A rejected CSV row. `record` is the 1-based index of the data record,
/// header excluded. Quoted fields may span lines, so it is not a line number.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub record: usize,
    pub message: String,
}

/// Import every row of `path` into `store`.
pub fn import_csv(store: &DuckStore, path: &Path) -> Result<ImportReport, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }

    let sql = format!(
        "SELECT * FROM read_csv('{}', header = true, all_varchar = true)",
        path.display().to_string().replace('\'', "''")
    );
    let batches = store.query_arrow(&sql)?;

    let mut report = ImportReport::default();
    let mut record = 0;
    for batch in &batches {
        for row in 0..batch.num_rows() {
            record += 1;
            let outcome = row_to_device(batch, row)
                .and_then(|dev| store.insert_device(&dev).map_err(|e| e.to_string()));
            match outcome {
                Ok(_) => report.inserted += 1,
                Err(message) => {
                    warn!(record, %message, "skipping CSV row");
                    report.failed.push(RowError { record, message });
                }
            }
        }
    }

    info!(
        path = %path.display(),
        inserted = report.inserted,
        failed = report.failed.len(),
        "CSV import finished"
    );
    Ok(report)
}

fn row_to_device(batch: &RecordBatch, row: usize) -> Result<NewDevice, String> {
    let field = |name: &str| -> Option<String> {
        batch
            .column_by_name(name)
            .and_then(|col| get_string(col.as_ref(), row))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    for &name in REQUIRED {
        if field(name).is_none() {
            return Err(format!("field '{name}' must not be empty"));
        }
    }

    let category_id = field("category_id")
        .unwrap_or_default()
        .parse::<i64>()
        .map_err(|_| "category_id is not an integer".to_string())?;

    let raw_price = field("price").unwrap_or_default();
    let price =
        parse_price(&raw_price).ok_or_else(|| format!("price '{raw_price}' is not a number"))?;

    let release_year = match field("release_year") {
        None => DEFAULT_RELEASE_YEAR,
        Some(y) => y
            .parse::<i32>()
            .map_err(|_| format!("release_year '{y}' is not an integer"))?,
    };

    let spec = |name: &str| Some(field(name).unwrap_or_else(|| NOT_AVAILABLE.to_string()));

    Ok(NewDevice {
        name: field("name").unwrap_or_default(),
        brand: field("brand").unwrap_or_default(),
        category_id: Some(category_id),
        cpu: spec("cpu"),
        gpu: spec("gpu"),
        ram: spec("ram"),
        storage: spec("storage"),
        camera: spec("camera"),
        battery: spec("battery"),
        screen: spec("screen"),
        release_year: Some(release_year),
        price: Some(price),
        image_url: field("image_url"),
        description: field("description"),
        source_url: field("source_data"),
    })
}

/// Read a string value from a Utf8 or LargeUtf8 column.
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some(arr.value(row).to_string());
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Some(arr.value(row).to_string());
    }
    None
}
