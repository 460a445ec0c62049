//! Export orchestration.
//!
//! [`ExportOrchestrator`] is the single entry point a UI talks to. It owns the
//! dataset for one screen, dispatches to the CSV, workbook and print paths,
//! and holds the custom-export dialog state. Every action returns an
//! [`ExportOutcome`]; failures are logged and folded into the outcome rather
//! than propagated.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::catalog::FieldCatalog;
use crate::csv::{CSV_MIME, csv_filename, generate_csv};
use crate::error::{ExportError, FallbackReason, Result};
use crate::pdf::PdfSurfaceProvider;
use crate::print::{DEFAULT_PRINT_DATE_FORMAT, PrintDocument, SurfaceProvider};
use crate::report_kind::ReportKind;
use crate::row::Row;
use crate::selector::Selection;
use crate::sink::{DownloadSink, ExportFile};
use crate::xlsx::{
    DEFAULT_COLUMN_WIDTH, SheetData, WorkbookEngine, WorkbookMetadata, XLSX_MIME, XlsxEngine,
    xlsx_filename,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Output format chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    DelimitedText,
    Workbook,
    PrintDocument,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DelimitedText => "csv",
            Self::Workbook => "xlsx",
            Self::PrintDocument => "print",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "delimited-text" => Ok(Self::DelimitedText),
            "xlsx" | "excel" | "workbook" => Ok(Self::Workbook),
            "print" | "pdf" | "print-document" => Ok(Self::PrintDocument),
            other => Err(ExportError::InvalidInput(format!(
                "unknown export format `{other}`"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation settings shared by every export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub author: String,
    pub subject: String,
    pub column_width: f64,
    pub print_date_format: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            author: "HR Dashboard".into(),
            subject: "Report data".into(),
            column_width: DEFAULT_COLUMN_WIDTH,
            print_date_format: DEFAULT_PRINT_DATE_FORMAT.into(),
        }
    }
}

/// The dataset a screen hands to the orchestrator.
#[derive(Debug, Clone)]
pub struct ExportSource {
    pub rows: Arc<[Row]>,
    pub filename_stem: String,
    pub catalog: FieldCatalog,
    pub report_kind: ReportKind,
}

impl ExportSource {
    pub fn new(
        rows: Vec<Row>,
        filename_stem: impl Into<String>,
        catalog: FieldCatalog,
        report_kind: ReportKind,
    ) -> Self {
        Self {
            rows: rows.into(),
            filename_stem: filename_stem.into(),
            catalog,
            report_kind,
        }
    }
}

/// What an export action ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// A file in the requested format was delivered.
    Downloaded {
        filename: String,
        format: ExportFormat,
    },
    /// The workbook could not be built; the same fields were delivered as CSV.
    FellBackToCsv {
        filename: String,
        reason: FallbackReason,
    },
    /// The print document was written to a surface and printed.
    Printed { document_name: String },
    /// No print surface could be opened; nothing was produced.
    PrintAborted,
    /// A custom export was requested with no fields selected.
    EmptySelection,
    /// Delivery itself failed (e.g. the output directory is not writable).
    Failed {
        format: ExportFormat,
        message: String,
    },
}

impl ExportOutcome {
    /// Whether the user received a file or a print dialog.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            Self::Downloaded { .. } | Self::FellBackToCsv { .. } | Self::Printed { .. }
        )
    }

    /// Name of the delivered file, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Downloaded { filename, .. } | Self::FellBackToCsv { filename, .. } => {
                Some(filename)
            }
            _ => None,
        }
    }
}

/// Custom-export dialog state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Closed,
    CustomExportOpen { selection: Selection },
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ---------------------------------------------------------------------------
// ExportOrchestrator
// ---------------------------------------------------------------------------

pub struct ExportOrchestrator {
    source: ExportSource,
    settings: ExportSettings,
    downloads: Arc<dyn DownloadSink>,
    surfaces: Arc<dyn SurfaceProvider>,
    workbook_engine: Arc<dyn WorkbookEngine>,
    clock: Clock,
    state: DialogState,
}

impl ExportOrchestrator {
    /// Create an orchestrator that delivers files to `downloads`.
    ///
    /// Printing goes to a PDF surface on the same sink and workbooks are
    /// built with [`XlsxEngine`] until overridden.
    pub fn new(source: ExportSource, downloads: Arc<dyn DownloadSink>) -> Self {
        let surfaces = Arc::new(PdfSurfaceProvider::new(Arc::clone(&downloads)));
        Self {
            source,
            settings: ExportSettings::default(),
            downloads,
            surfaces,
            workbook_engine: Arc::new(XlsxEngine),
            clock: Arc::new(Utc::now),
            state: DialogState::Closed,
        }
    }

    pub fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_surface_provider(mut self, surfaces: Arc<dyn SurfaceProvider>) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn with_workbook_engine(mut self, engine: Arc<dyn WorkbookEngine>) -> Self {
        self.workbook_engine = engine;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn source(&self) -> &ExportSource {
        &self.source
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    /// Display title for this screen's report kind.
    pub fn title(&self) -> &'static str {
        self.source.report_kind.title()
    }

    // -- Quick actions ------------------------------------------------------

    /// Export delimited text. Without `fields`, every catalog field is used.
    pub fn export_csv(&self, fields: Option<&Selection>) -> ExportOutcome {
        let keys = match fields {
            Some(selection) => selection.keys().to_vec(),
            None => self.source.catalog.keys(),
        };
        let now = (self.clock)();

        match self.deliver_csv(&keys, now) {
            Ok(filename) => {
                info!("CSV export: {filename} ({} rows)", self.source.rows.len());
                ExportOutcome::Downloaded {
                    filename,
                    format: ExportFormat::DelimitedText,
                }
            }
            Err(e) => self.failed(ExportFormat::DelimitedText, e),
        }
    }

    /// Export a workbook, falling back to CSV with the same fields if the
    /// workbook cannot be built.
    ///
    /// Without `fields`, the open dialog's selection is used, or every
    /// catalog field when no dialog is open.
    pub async fn export_workbook(&self, fields: Option<&Selection>) -> ExportOutcome {
        let keys = match (fields, &self.state) {
            (Some(selection), _) => selection.keys().to_vec(),
            (None, DialogState::CustomExportOpen { selection }) => selection.keys().to_vec(),
            (None, DialogState::Closed) => self.source.catalog.keys(),
        };
        let now = (self.clock)();

        let sheet = SheetData::build(&self.source.rows, &keys, &self.source.catalog);
        let metadata = WorkbookMetadata {
            title: self.title().to_string(),
            subject: self.settings.subject.clone(),
            author: self.settings.author.clone(),
            created: now,
            column_width: self.settings.column_width,
        };

        match self.workbook_engine.build(&sheet, &metadata).await {
            Ok(bytes) => {
                let filename = xlsx_filename(&self.source.filename_stem, now);
                match self
                    .downloads
                    .deliver(&ExportFile::new(filename.clone(), XLSX_MIME, bytes))
                {
                    Ok(()) => {
                        info!("Workbook export: {filename} ({} rows)", sheet.rows.len());
                        ExportOutcome::Downloaded {
                            filename,
                            format: ExportFormat::Workbook,
                        }
                    }
                    Err(e) => self.failed(ExportFormat::Workbook, e),
                }
            }
            Err(reason) => {
                warn!("Workbook export failed ({reason}); falling back to CSV");
                match self.deliver_csv(&keys, now) {
                    Ok(filename) => ExportOutcome::FellBackToCsv { filename, reason },
                    Err(e) => self.failed(ExportFormat::DelimitedText, e),
                }
            }
        }
    }

    /// Render every catalog field into a print document and print it.
    ///
    /// If no surface can be opened the action is silently abandoned.
    pub fn export_print(&self) -> ExportOutcome {
        let now = (self.clock)();
        let document_name = format!(
            "{}-{}",
            self.source.filename_stem,
            now.format("%Y-%m-%d")
        );

        let Some(mut surface) = self.surfaces.open(&document_name) else {
            debug!("Print surface unavailable for {document_name}; skipping print");
            return ExportOutcome::PrintAborted;
        };

        let document = PrintDocument::build(
            &self.source.rows,
            &self.source.catalog,
            &self.source.report_kind,
            now,
            &self.settings.print_date_format,
        );

        let printed = surface.write(&document).and_then(|()| surface.print());
        match printed {
            Ok(()) => {
                info!(
                    "Print export: {document_name} ({} rows, {} columns)",
                    document.record_count,
                    document.headers.len()
                );
                ExportOutcome::Printed { document_name }
            }
            Err(e) => self.failed(ExportFormat::PrintDocument, e),
        }
    }

    /// Export with an explicit selection. The print format ignores it.
    pub async fn export_custom(&self, format: ExportFormat, selection: &Selection) -> ExportOutcome {
        if selection.is_empty() && format != ExportFormat::PrintDocument {
            debug!("Custom {format} export refused: no fields selected");
            return ExportOutcome::EmptySelection;
        }

        match format {
            ExportFormat::DelimitedText => self.export_csv(Some(selection)),
            ExportFormat::Workbook => self.export_workbook(Some(selection)).await,
            ExportFormat::PrintDocument => self.export_print(),
        }
    }

    // -- Custom export dialog -----------------------------------------------

    /// Open the dialog with a selection seeded from the required fields.
    pub fn open_custom_export(&mut self) {
        self.state = DialogState::CustomExportOpen {
            selection: Selection::initialize(&self.source.catalog),
        };
    }

    /// Current dialog selection, if the dialog is open.
    pub fn selection(&self) -> Option<&Selection> {
        match &self.state {
            DialogState::CustomExportOpen { selection } => Some(selection),
            DialogState::Closed => None,
        }
    }

    /// Toggle a field in the open dialog. No-op when closed.
    pub fn toggle_field(&mut self, key: &str) {
        if let DialogState::CustomExportOpen { selection } = &mut self.state {
            selection.toggle_in_place(&self.source.catalog, key);
        }
    }

    /// Return the open dialog's selection to the required fields.
    pub fn reset_selection(&mut self) {
        if let DialogState::CustomExportOpen { selection } = &mut self.state {
            *selection = Selection::reset(&self.source.catalog);
        }
    }

    /// Whether the confirm action is currently allowed.
    pub fn can_confirm(&self) -> bool {
        self.selection().is_some_and(|s| !s.is_empty())
    }

    /// Export the dialog's selection and close the dialog.
    ///
    /// Returns `None` (and leaves the state untouched) when the dialog is
    /// closed or nothing is selected.
    pub async fn confirm_custom_export(&mut self, format: ExportFormat) -> Option<ExportOutcome> {
        if !self.can_confirm() {
            return None;
        }
        let DialogState::CustomExportOpen { selection } = std::mem::take(&mut self.state) else {
            return None;
        };
        Some(self.export_custom(format, &selection).await)
    }

    /// Close the dialog without exporting.
    pub fn cancel_custom_export(&mut self) {
        self.state = DialogState::Closed;
    }

    // -- Internals ----------------------------------------------------------

    fn deliver_csv(&self, keys: &[String], now: DateTime<Utc>) -> Result<String> {
        let text = generate_csv(&self.source.rows, keys, &self.source.catalog);
        let filename = csv_filename(&self.source.filename_stem, now);
        self.downloads
            .deliver(&ExportFile::new(filename.clone(), CSV_MIME, text.into_bytes()))?;
        Ok(filename)
    }

    fn failed(&self, format: ExportFormat, err: ExportError) -> ExportOutcome {
        error!(
            "{format} export of {} failed: {err}",
            self.source.filename_stem
        );
        ExportOutcome::Failed {
            format,
            message: err.to_string(),
        }
    }
}
