//! Receipt dataset reader.
//!
//! A dataset is a directory of `batch_*.json` files, each holding a JSON
//! array of customers with their receipts:
//!
//! ```json
//! [{ "customer_id": "customer_000001",
//!    "customer_name": "Jordan Lee",
//!    "receipts": [{ "pickup_date": "2024-05-03",
//!                   "items": [{ "name": "Bananas", "price": 3.98, "quantity": 2 }] }] }]
//! ```
//!
//! `pickup_date` is either ISO (`2024-05-03`) or long form
//! (`Friday, May 03, 2024`). Unreadable receipts are skipped, not fatal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::customer::{CustomerId, CustomerPurchases};
use crate::domain::purchase::PurchaseEvent;
use crate::errors::DomainError;

const BATCH_PREFIX: &str = "batch_";
const BATCH_EXTENSION: &str = ".json";
const PICKUP_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%A, %B %d, %Y"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset directory not found: `{0}`")]
    MissingDirectory(PathBuf),
    #[error("no `batch_*.json` files found in `{0}`")]
    NoBatchFiles(PathBuf),
    #[error("could not read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse batch file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    customer_id: String,
    #[serde(default)]
    customer_name: Option<String>,
    /// Kept raw so one malformed receipt cannot fail the whole batch file.
    #[serde(default)]
    receipts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ReceiptRecord {
    pickup_date: Option<String>,
    #[serde(default)]
    items: Vec<ReceiptItemRecord>,
}

#[derive(Debug, Deserialize)]
struct ReceiptItemRecord {
    name: Option<String>,
    price: Option<Decimal>,
    quantity: Option<u32>,
}

/// Customers read from one dataset directory, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub customers: Vec<CustomerPurchases>,
    pub batch_files: usize,
    pub skipped_receipts: usize,
}

impl Dataset {
    /// Most recent purchase across every customer.
    pub fn latest_purchase_date(&self) -> Option<NaiveDate> {
        self.customers.iter().filter_map(CustomerPurchases::latest_purchase_date).max()
    }

    pub fn customer(&self, customer_id: &str) -> Option<&CustomerPurchases> {
        self.customers.iter().find(|customer| customer.customer_id.0 == customer_id)
    }

    pub fn purchase_count(&self) -> usize {
        self.customers.iter().map(|customer| customer.events.len()).sum()
    }
}

pub fn parse_pickup_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    PICKUP_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Sorted `batch_*.json` paths inside `dir`.
pub fn batch_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir)
        .map_err(|source| DatasetError::ReadFile { path: dir.to_path_buf(), source })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|source| DatasetError::ReadFile { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        let is_batch = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(BATCH_PREFIX) && name.ends_with(BATCH_EXTENSION))
            .unwrap_or(false);
        if is_batch && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(DatasetError::NoBatchFiles(dir.to_path_buf()));
    }
    Ok(files)
}

/// Reads every batch file in `dir`, merging customers that span batches.
pub fn load_dir(dir: &Path) -> Result<Dataset, DatasetError> {
    let files = batch_files(dir)?;
    let mut dataset = Dataset { batch_files: files.len(), ..Dataset::default() };
    let mut positions: HashMap<String, usize> = HashMap::new();

    for path in &files {
        let raw = fs::read_to_string(path)
            .map_err(|source| DatasetError::ReadFile { path: path.clone(), source })?;
        let records: Vec<CustomerRecord> = serde_json::from_str(&raw)
            .map_err(|source| DatasetError::ParseFile { path: path.clone(), source })?;

        for record in records {
            let (customer, skipped) = into_customer(record);
            dataset.skipped_receipts += skipped;

            match positions.get(&customer.customer_id.0) {
                Some(&index) => dataset.customers[index].events.extend(customer.events),
                None => {
                    positions.insert(customer.customer_id.0.clone(), dataset.customers.len());
                    dataset.customers.push(customer);
                }
            }
        }
    }

    info!(
        event_name = "dataset.loaded",
        path = %dir.display(),
        batch_files = dataset.batch_files,
        customers = dataset.customers.len(),
        purchases = dataset.purchase_count(),
        skipped_receipts = dataset.skipped_receipts,
        "purchase dataset loaded"
    );

    Ok(dataset)
}

fn into_customer(record: CustomerRecord) -> (CustomerPurchases, usize) {
    let mut events = Vec::new();
    let mut skipped = 0;

    for receipt in &record.receipts {
        match receipt_events(receipt) {
            Ok(mut receipt_events) => events.append(&mut receipt_events),
            Err(error) => {
                skipped += 1;
                let pickup_date =
                    receipt.get("pickup_date").and_then(Value::as_str).unwrap_or("<missing>");
                warn!(
                    event_name = "dataset.receipt.skipped",
                    customer_id = record.customer_id.as_str(),
                    pickup_date,
                    error = %error,
                    "skipping unreadable receipt"
                );
            }
        }
    }

    let customer = CustomerPurchases {
        customer_id: CustomerId(record.customer_id),
        customer_name: record.customer_name,
        events,
    };
    (customer, skipped)
}

fn receipt_events(raw: &Value) -> Result<Vec<PurchaseEvent>, DomainError> {
    let receipt = ReceiptRecord::deserialize(raw)
        .map_err(|error| DomainError::invalid_input(format!("malformed receipt: {error}")))?;

    let Some(pickup_date) = receipt.pickup_date.as_deref() else {
        return Err(DomainError::invalid_input("receipt has no pickup_date"));
    };
    let date = parse_pickup_date(pickup_date).ok_or_else(|| {
        DomainError::invalid_input(format!("unrecognised pickup_date `{pickup_date}`"))
    })?;

    receipt
        .items
        .into_iter()
        .map(|item| {
            let name = item
                .name
                .ok_or_else(|| DomainError::invalid_input("receipt item has no name"))?;
            let price = item.price.ok_or_else(|| {
                DomainError::invalid_input(format!("receipt item `{name}` has no price"))
            })?;
            PurchaseEvent::new(name, date, price, item.quantity.unwrap_or(1))
        })
        .collect()
}
