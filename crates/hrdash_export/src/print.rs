//! Print document rendering.
//!
//! The print path always uses the whole catalog. The document is handed to a
//! [`PrintSurface`] opened through a [`SurfaceProvider`]; if no surface can be
//! opened the print is abandoned without output.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};

use crate::catalog::FieldCatalog;
use crate::error::Result;
use crate::report_kind::ReportKind;
use crate::row::Row;

/// Date format used for the "generated" line when nothing else is configured.
pub const DEFAULT_PRINT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

// ---------------------------------------------------------------------------
// PrintDocument
// ---------------------------------------------------------------------------

/// A rendered-ready report: title, metadata lines and a full-catalog table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    pub title: String,
    pub generated_at: String,
    pub record_count: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PrintDocument {
    /// Build the document from every catalog field, in catalog order.
    pub fn build(
        rows: &[Row],
        catalog: &FieldCatalog,
        kind: &ReportKind,
        now: DateTime<Utc>,
        date_format: &str,
    ) -> Self {
        let headers = catalog.labels().into_iter().map(String::from).collect();
        let body = rows
            .iter()
            .map(|row| {
                catalog
                    .fields()
                    .iter()
                    .map(|field| row.text(&field.key))
                    .collect()
            })
            .collect();

        Self {
            title: kind.title().to_string(),
            generated_at: format_local(now, date_format),
            record_count: rows.len(),
            headers,
            rows: body,
        }
    }

    /// Number of table rows including the header row.
    pub fn table_row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Render a standalone HTML page with inline styling.
    pub fn to_html(&self) -> String {
        let body = format!(
            "<h1>{title}</h1>\n<div class=\"meta\">\n    <p>Generated: {date}</p>\n    <p>Total records: {count}</p>\n</div>\n{table}",
            title = escape_html(&self.title),
            date = escape_html(&self.generated_at),
            count = self.record_count,
            table = self.table_html(),
        );
        html_page(&self.title, &body)
    }

    /// The data table with a `thead` so browsers repeat it on every page.
    fn table_html(&self) -> String {
        let mut html = format!(
            "<table>\n<thead>\n<tr>\n{}</tr>\n</thead>\n<tbody>\n",
            table_cells("th", &self.headers)
        );
        for row in &self.rows {
            html.push_str(&format!("<tr>\n{}</tr>\n", table_cells("td", row)));
        }
        html.push_str("</tbody>\n</table>");
        html
    }
}

/// Format `now` in the local timezone. An invalid pattern falls back to
/// [`DEFAULT_PRINT_DATE_FORMAT`].
pub fn format_local(now: DateTime<Utc>, pattern: &str) -> String {
    let valid = !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
    let pattern = if valid { pattern } else { DEFAULT_PRINT_DATE_FORMAT };
    now.with_timezone(&Local).format(pattern).to_string()
}

fn html_page(title: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; color: #333; }}
        h1 {{ text-align: center; margin-bottom: 8px; }}
        .meta {{ text-align: center; font-size: 12px; color: #666; margin-bottom: 16px; }}
        .meta p {{ margin: 2px 0; }}
        table {{ border-collapse: collapse; width: 100%; font-size: 12px; }}
        th, td {{ border: 1px solid #ddd; padding: 6px; text-align: left; }}
        th {{ background-color: #f4f4f4; font-weight: 600; }}
        tr:nth-child(even) {{ background-color: #fafafa; }}
        @media print {{ body {{ margin: 0; }} thead {{ display: table-header-group; }} tr {{ page-break-inside: avoid; }} }}
    </style>
</head>
<body>
{body_html}
</body>
</html>"#,
        title = escape_html(title),
        body_html = body_html,
    )
}

fn table_cells(tag: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("    <{tag}>{}</{tag}>\n", escape_html(v)))
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// A place a print document can be shown and printed from.
pub trait PrintSurface {
    /// Load the document into the surface.
    fn write(&mut self, document: &PrintDocument) -> Result<()>;

    /// Issue the print command for whatever was written.
    fn print(&mut self) -> Result<()>;
}

/// Opens print surfaces. Returns `None` when the environment refuses
/// (for example a blocked pop-up).
pub trait SurfaceProvider: Send + Sync {
    fn open(&self, document_name: &str) -> Option<Box<dyn PrintSurface>>;
}

/// Provider that can never open a surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockedSurfaceProvider;

impl SurfaceProvider for BlockedSurfaceProvider {
    fn open(&self, _document_name: &str) -> Option<Box<dyn PrintSurface>> {
        None
    }
}
