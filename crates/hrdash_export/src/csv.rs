use chrono::{DateTime, Utc};

use crate::catalog::FieldCatalog;
use crate::row::Row;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// Generate delimited text from rows and an ordered list of field keys.
///
/// The first line holds the catalog labels of `keys`. Lines are joined with
/// `\n` and there is no trailing newline, so the output always has
/// `rows.len() + 1` lines.
pub fn generate_csv(rows: &[Row], keys: &[String], catalog: &FieldCatalog) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    let header: Vec<&str> = keys.iter().map(|k| catalog.label_for(k)).collect();
    lines.push(header.join(","));

    for row in rows {
        let cells: Vec<String> = keys.iter().map(|k| escape_field(&row.text(k))).collect();
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

/// Quote a value that contains a comma.
///
/// Embedded double quotes are left as-is; downstream consumers rely on this
/// exact output.
pub fn escape_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// `{stem}-{YYYY-MM-DD}.csv`
pub fn csv_filename(stem: &str, now: DateTime<Utc>) -> String {
    format!("{stem}-{}.csv", now.format("%Y-%m-%d"))
}
