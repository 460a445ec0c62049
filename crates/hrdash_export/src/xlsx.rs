use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use tracing::debug;

use crate::catalog::FieldCatalog;
use crate::error::FallbackReason;
use crate::row::{Row, value_text};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Name of the single worksheet in every exported workbook.
pub const SHEET_NAME: &str = "Data";

/// Column width (in characters) applied when no setting overrides it.
pub const DEFAULT_COLUMN_WIDTH: f64 = 20.0;

// ---------------------------------------------------------------------------
// Sheet data
// ---------------------------------------------------------------------------

/// The grid written to the sheet: a header row of labels plus one row of
/// stringified cells per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// Build the grid for `keys`. Missing values are empty strings and
    /// nested values use compact JSON.
    pub fn build(rows: &[Row], keys: &[String], catalog: &FieldCatalog) -> Self {
        let headers = keys
            .iter()
            .map(|k| catalog.label_for(k).to_string())
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                keys.iter()
                    .map(|k| row.get(k).map(value_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Document properties written into the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookMetadata {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub column_width: f64,
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

/// Backend that turns a [`SheetData`] into workbook bytes.
///
/// Building may suspend (e.g. while a formatting backend is loaded). Any
/// failure is reported as a [`FallbackReason`] so the caller can degrade to
/// delimited text.
#[async_trait]
pub trait WorkbookEngine: Send + Sync {
    async fn build(
        &self,
        sheet: &SheetData,
        metadata: &WorkbookMetadata,
    ) -> Result<Vec<u8>, FallbackReason>;
}

/// Workbook engine backed by `rust_xlsxwriter`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxEngine;

#[async_trait]
impl WorkbookEngine for XlsxEngine {
    async fn build(
        &self,
        sheet: &SheetData,
        metadata: &WorkbookMetadata,
    ) -> Result<Vec<u8>, FallbackReason> {
        generate_xlsx(sheet, metadata)
    }
}

/// Write a single-sheet xlsx file and return its raw bytes.
///
/// Cells are written as strings exactly as they appear in the grid.
pub fn generate_xlsx(
    sheet: &SheetData,
    metadata: &WorkbookMetadata,
) -> Result<Vec<u8>, FallbackReason> {
    let mut workbook = Workbook::new();
    workbook.set_properties(&document_properties(metadata)?);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();

    for (col, header) in sheet.headers.iter().enumerate() {
        let col = column_index(col)?;
        worksheet.write_string_with_format(0, col, header, &header_format)?;
        worksheet.set_column_width(col, metadata.column_width)?;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1)
            .map_err(|_| FallbackReason::ConstructionFailed("too many rows".into()))?;
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet.write_string(excel_row, column_index(col_idx)?, cell)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Built workbook: {} columns, {} rows, {} bytes",
        sheet.column_count(),
        sheet.rows.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn column_index(col: usize) -> Result<u16, FallbackReason> {
    u16::try_from(col)
        .map_err(|_| FallbackReason::ConstructionFailed(format!("column {col} out of range")))
}

fn document_properties(metadata: &WorkbookMetadata) -> Result<DocProperties, FallbackReason> {
    let created = &metadata.created;
    let year = u16::try_from(created.year())
        .map_err(|_| FallbackReason::ConstructionFailed("creation year out of range".into()))?;
    let timestamp = ExcelDateTime::from_ymd(year, created.month() as u8, created.day() as u8)?
        .and_hms(
            created.hour() as u16,
            created.minute() as u8,
            created.second(),
        )?;

    Ok(DocProperties::new()
        .set_title(&metadata.title)
        .set_subject(&metadata.subject)
        .set_author(&metadata.author)
        .set_creation_datetime(&timestamp))
}

/// `{stem}-{YYYY-MM-DDTHH-MM-SS}.xlsx`
pub fn xlsx_filename(stem: &str, now: DateTime<Utc>) -> String {
    format!("{stem}-{}.xlsx", now.format("%Y-%m-%dT%H-%M-%S"))
}
