//! CSV ingestion
//!
//! Two formats are accepted:
//! - **Upload** - `date,description,amount`; categories are assigned by the
//!   classifier afterwards.
//! - **Bulk** - `user_id,date,description,amount,category`; categories are
//!   pre-assigned.
//!
//! Columns are located by header name (order does not matter, extra columns
//! are ignored). Parsing is all-or-nothing: callers only see rows once the
//! whole file has been read and checked.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewTransaction, RawTransaction};

const UPLOAD_COLUMNS: [&str; 3] = ["date", "description", "amount"];
const BULK_COLUMNS: [&str; 5] = ["user_id", "date", "description", "amount", "category"];

/// One row of an upload file, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// Parse an upload CSV
///
/// Rows with an empty date, description or amount are skipped. A missing
/// column or a non-numeric amount fails the whole file.
pub fn parse_upload<R: Read>(reader: R) -> Result<Vec<UploadRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let [date_idx, desc_idx, amount_idx] = locate_columns(&headers, UPLOAD_COLUMNS)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 2;

        let date = cell(&record, date_idx);
        let description = cell(&record, desc_idx);
        let amount = cell(&record, amount_idx);

        let (Some(date), Some(description), Some(amount)) = (date, description, amount) else {
            skipped += 1;
            continue;
        };

        rows.push(UploadRow {
            date: date.to_string(),
            description: description.to_string(),
            amount: parse_amount(amount, line)?,
        });
    }

    debug!(rows = rows.len(), skipped, "Parsed upload CSV");
    Ok(rows)
}

/// Parse a bulk-load CSV. Every cell of every row is required.
pub fn parse_bulk<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let [user_idx, date_idx, desc_idx, amount_idx, cat_idx] =
        locate_columns(&headers, BULK_COLUMNS)?;

    let mut txs = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 2;

        let amount = cell(&record, amount_idx)
            .map(|a| parse_amount(a, line))
            .transpose()?;

        let raw = RawTransaction {
            user_id: cell(&record, user_idx).map(str::to_string),
            date: cell(&record, date_idx).map(str::to_string),
            description: cell(&record, desc_idx).map(str::to_string),
            amount,
            category: cell(&record, cat_idx).map(str::to_string),
        };

        let tx = raw.validate().map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("line {}: {}", line, msg)),
            other => other,
        })?;
        txs.push(tx);
    }

    debug!(rows = txs.len(), "Parsed bulk CSV");
    Ok(txs)
}

/// Find each required column by name, reporting every one that is absent
fn locate_columns<const N: usize>(
    headers: &StringRecord,
    required: [&str; N],
) -> Result<[usize; N]> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let mut found = [0usize; N];
    let mut missing = Vec::new();
    for (slot, name) in found.iter_mut().zip(required) {
        match normalized.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name),
        }
    }

    if missing.is_empty() {
        Ok(found)
    } else {
        Err(Error::Validation(format!(
            "CSV is missing required columns: {}",
            missing.join(", ")
        )))
    }
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|v| !v.is_empty())
}

fn parse_amount(s: &str, line: usize) -> Result<f64> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::Validation(format!(
            "line {}: amount '{}' is not a number",
            line, s
        ))),
    }
}
