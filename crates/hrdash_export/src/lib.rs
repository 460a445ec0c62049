//! Report export engine: turns catalog-described row collections into
//! delimited text, xlsx workbooks and printable documents.

pub mod catalog;
pub mod csv;
pub mod error;
pub mod orchestrator;
pub mod pdf;
pub mod print;
pub mod report_kind;
pub mod row;
pub mod selector;
pub mod sink;
pub mod xlsx;

pub use catalog::{FieldCatalog, FieldSpec};
pub use error::{ExportError, FallbackReason};
pub use orchestrator::{
    DialogState, ExportFormat, ExportOrchestrator, ExportOutcome, ExportSettings, ExportSource,
};
pub use print::{BlockedSurfaceProvider, PrintDocument, PrintSurface, SurfaceProvider};
pub use pdf::PdfSurfaceProvider;
pub use report_kind::ReportKind;
pub use row::Row;
pub use selector::Selection;
pub use sink::{DirectorySink, DownloadSink, ExportFile, MemorySink};
pub use xlsx::{SheetData, WorkbookEngine, WorkbookMetadata, XlsxEngine};
