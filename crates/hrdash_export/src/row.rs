//! Catalog-driven rows.
//!
//! A row is an open JSON object; the engine never assumes a fixed record
//! shape and never mutates what the caller hands in.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExportError, Result};

/// One record of the exported dataset, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Plain text of `key`: missing and null become an empty string.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(value_text).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Stringify a cell value.
///
/// Strings are taken verbatim (no JSON quoting), scalars use their display
/// form and nested arrays/objects use compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parse rows from a JSON array of objects, the shape the REST API returns.
pub fn rows_from_json(input: &str) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_str(input)?;
    let Value::Array(items) = value else {
        return Err(ExportError::InvalidInput(
            "expected a JSON array of row objects".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(Row::from(map)),
            other => Err(ExportError::InvalidInput(format!(
                "row {idx} is not an object: {other}"
            ))),
        })
        .collect()
}

/// Parse rows from CSV text; the first record supplies the field keys.
///
/// Every cell is kept as a string and empty cells become null so they behave
/// like missing values downstream.
pub fn rows_from_csv(input: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut map = Map::new();
        for (key, cell) in headers.iter().zip(record.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            map.insert(key.clone(), value);
        }
        rows.push(Row(map));
    }

    Ok(rows)
}

/// Load rows from a file, choosing the parser by extension (`.csv` or JSON).
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)?;
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        rows_from_csv(&content)
    } else {
        rows_from_json(&content)
    }
}
