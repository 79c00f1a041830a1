//! Wearable file parsing
//!
//! Accepts the export shapes fitness apps commonly produce:
//! - CSV with a header row and an optional `date` column
//! - JSON array of objects
//! - NDJSON (one object per line)
//!
//! Every non-date column is treated as a numeric channel. Empty or non-numeric
//! cells are simply absent from the record.

use super::series::{WearableRecord, WearableSeries, DATE_COLUMN};
use crate::error::InsightError;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Supported wearable file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearableFormat {
    Csv,
    Json,
    Ndjson,
}

impl WearableFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, InsightError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(WearableFormat::Csv),
            "json" => Ok(WearableFormat::Json),
            "ndjson" | "jsonl" => Ok(WearableFormat::Ndjson),
            _ => Err(InsightError::UnsupportedFormat(format!(
                "{} (expected .csv, .json or .ndjson)",
                path.display()
            ))),
        }
    }
}

/// Parser for wearable exports
pub struct WearableParser;

impl WearableParser {
    /// Parse content in the given format
    pub fn parse(content: &str, format: WearableFormat) -> Result<WearableSeries, InsightError> {
        let series = match format {
            WearableFormat::Csv => Self::parse_csv(content)?,
            WearableFormat::Json => Self::parse_array(content)?,
            WearableFormat::Ndjson => Self::parse_ndjson(content)?,
        };
        debug!(
            records = series.len(),
            columns = series.columns().len(),
            "parsed wearable series"
        );
        Ok(series)
    }

    /// Read and parse a file, choosing the format from its extension
    pub fn parse_file(path: &Path) -> Result<WearableSeries, InsightError> {
        let format = WearableFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse CSV with a header row. Quoted cells may contain commas.
    pub fn parse_csv(content: &str) -> Result<WearableSeries, InsightError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error("header row", e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| csv_error("row", e))?;
            let line = row.position().map_or(0, |p| p.line());
            let mut record = WearableRecord::default();

            for (idx, header) in headers.iter().enumerate() {
                let cell = row.get(idx).unwrap_or("");
                if header.eq_ignore_ascii_case(DATE_COLUMN) {
                    record.date = parse_date_cell(cell).map_err(|e| {
                        InsightError::DateParseError(format!("line {}: {}", line, e))
                    })?;
                } else if let Some(value) = parse_numeric_cell(cell) {
                    record.channels.insert(header.clone(), value);
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(InsightError::EmptyData(
                "CSV must have a header row and at least one data row".to_string(),
            ));
        }
        if headers.iter().all(|h| h.is_empty()) {
            return Err(InsightError::ParseError("CSV header row is empty".to_string()));
        }

        Ok(WearableSeries::new(records, headers))
    }

    /// Parse a JSON array of record objects
    pub fn parse_array(json: &str) -> Result<WearableSeries, InsightError> {
        let value: Value = serde_json::from_str(json)?;
        let items = value.as_array().ok_or_else(|| {
            InsightError::ParseError("expected a JSON array of records".to_string())
        })?;

        if items.is_empty() {
            return Err(InsightError::EmptyData("JSON array is empty".to_string()));
        }

        let mut columns = Vec::new();
        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| {
                InsightError::ParseError(format!("record {} is not an object", idx + 1))
            })?;
            records.push(record_from_object(object, &mut columns).map_err(|e| {
                InsightError::DateParseError(format!("record {}: {}", idx + 1, e))
            })?);
        }

        Ok(WearableSeries::new(records, columns))
    }

    /// Parse NDJSON (newline-delimited JSON) records
    pub fn parse_ndjson(ndjson: &str) -> Result<WearableSeries, InsightError> {
        let mut columns = Vec::new();
        let mut records = Vec::new();

        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                InsightError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            let object = value.as_object().ok_or_else(|| {
                InsightError::ParseError(format!("line {} is not an object", line_num + 1))
            })?;
            records.push(record_from_object(object, &mut columns).map_err(|e| {
                InsightError::DateParseError(format!("line {}: {}", line_num + 1, e))
            })?);
        }

        if records.is_empty() {
            return Err(InsightError::EmptyData("no records in NDJSON input".to_string()));
        }

        Ok(WearableSeries::new(records, columns))
    }
}

fn record_from_object(
    object: &Map<String, Value>,
    columns: &mut Vec<String>,
) -> Result<WearableRecord, String> {
    let mut record = WearableRecord::default();

    for (key, value) in object {
        if !columns.iter().any(|c| c == key) {
            columns.push(key.clone());
        }

        if key.eq_ignore_ascii_case(DATE_COLUMN) {
            record.date = parse_date_value(value)?;
            continue;
        }

        let numeric = match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => parse_numeric_cell(s),
            _ => None,
        };
        if let Some(v) = numeric {
            record.channels.insert(key.clone(), v);
        }
    }

    Ok(record)
}

fn csv_error(what: &str, e: csv::Error) -> InsightError {
    match e.position() {
        Some(pos) => InsightError::ParseError(format!("CSV {} at line {}: {}", what, pos.line(), e)),
        None => InsightError::ParseError(format!("CSV {}: {}", what, e)),
    }
}

/// Date from a JSON value: a date string, epoch milliseconds, or null
fn parse_date_value(value: &Value) -> Result<Option<NaiveDate>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => parse_date_cell(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| format!("invalid epoch milliseconds {}", n)),
        other => Err(format!("unsupported date value {}", other)),
    }
}

fn parse_numeric_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell; empty cells are absent, timestamps keep their date part
fn parse_date_cell(cell: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .map(Some)
        .map_err(|e| format!("invalid date '{}': {}", trimmed, e))
}
