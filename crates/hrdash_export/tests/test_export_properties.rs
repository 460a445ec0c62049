use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hrdash_export::csv::generate_csv;
use hrdash_export::*;
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 14, 16, 5, 9).unwrap()
}

fn scenario_catalog() -> FieldCatalog {
    FieldCatalog::new(vec![
        FieldSpec::required("name", "Name"),
        FieldSpec::optional("email", "Email"),
    ])
    .unwrap()
}

fn scenario_rows() -> Vec<Row> {
    vec![
        Row::new().with("name", "Ada").with("email", "a@x.com"),
        Row::new().with("name", "Lin"),
    ]
}

fn payroll_catalog() -> FieldCatalog {
    FieldCatalog::new(vec![
        FieldSpec::required("employee", "Employee"),
        FieldSpec::optional("period", "Period"),
        FieldSpec::required("gross", "Gross Salary"),
        FieldSpec::optional("deductions", "Deductions"),
        FieldSpec::optional("net", "Net Salary"),
    ])
    .unwrap()
}

fn payroll_rows() -> Vec<Row> {
    vec![
        Row::new()
            .with("employee", "Yilmaz, Ayse")
            .with("period", "2025-01")
            .with("gross", 52000)
            .with("deductions", json!({"tax": 7800, "sgk": 7280}))
            .with("net", 36920),
        Row::new()
            .with("employee", "Demir, Can")
            .with("gross", 48000.5)
            .with("net", serde_json::Value::Null),
        Row::new().with("employee", "Kaya"),
    ]
}

fn payroll_orchestrator(sink: Arc<MemorySink>) -> ExportOrchestrator {
    let source = ExportSource::new(payroll_rows(), "payroll", payroll_catalog(), ReportKind::Payroll);
    ExportOrchestrator::new(source, sink).with_clock(now)
}

struct BrokenEngine;

#[async_trait]
impl WorkbookEngine for BrokenEngine {
    async fn build(
        &self,
        _sheet: &SheetData,
        _metadata: &WorkbookMetadata,
    ) -> Result<Vec<u8>, FallbackReason> {
        Err(FallbackReason::ConstructionFailed("simulated".into()))
    }
}

/// Records the document it was asked to print.
struct RecordingProvider {
    printed: Arc<parking_lot::Mutex<Vec<PrintDocument>>>,
}

struct RecordingSurface {
    pending: Option<PrintDocument>,
    printed: Arc<parking_lot::Mutex<Vec<PrintDocument>>>,
}

impl SurfaceProvider for RecordingProvider {
    fn open(&self, _document_name: &str) -> Option<Box<dyn PrintSurface>> {
        Some(Box::new(RecordingSurface {
            pending: None,
            printed: Arc::clone(&self.printed),
        }))
    }
}

impl PrintSurface for RecordingSurface {
    fn write(&mut self, document: &PrintDocument) -> hrdash_export::error::Result<()> {
        self.pending = Some(document.clone());
        Ok(())
    }

    fn print(&mut self) -> hrdash_export::error::Result<()> {
        if let Some(doc) = self.pending.take() {
            self.printed.lock().push(doc);
        }
        Ok(())
    }
}

fn last_text(sink: &MemorySink) -> String {
    String::from_utf8(sink.last().expect("a delivered file").bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

#[test]
fn initialize_returns_required_subset_in_catalog_order() {
    let selection = Selection::initialize(&payroll_catalog());
    assert_eq!(selection.keys(), ["employee", "gross"]);
}

#[test]
fn toggling_required_field_leaves_selection_unchanged() {
    let catalog = payroll_catalog();
    let selection = Selection::initialize(&catalog)
        .toggle(&catalog, "net")
        .toggle(&catalog, "period");
    for key in catalog.required_keys() {
        assert_eq!(selection.toggle(&catalog, &key), selection);
    }
}

#[test]
fn toggling_optional_field_twice_is_identity() {
    let catalog = payroll_catalog();
    let selection = Selection::initialize(&catalog).toggle(&catalog, "deductions");
    for key in ["period", "deductions", "net"] {
        assert_eq!(
            selection.toggle(&catalog, key).toggle(&catalog, key),
            selection
        );
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn csv_line_and_column_counts_match_selection() {
    let catalog = payroll_catalog();
    let rows = payroll_rows();
    let selection = Selection::initialize(&catalog)
        .toggle(&catalog, "net")
        .toggle(&catalog, "period");

    let out = generate_csv(&rows, selection.keys(), &catalog);
    let lines: Vec<&str> = out.split('\n').collect();
    assert_eq!(lines.len(), rows.len() + 1);

    let header: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(header, vec!["Employee", "Gross Salary", "Net Salary", "Period"]);
}

#[test]
fn csv_quotes_only_values_with_commas() {
    let catalog = payroll_catalog();
    let keys = vec!["employee".to_string(), "period".to_string()];
    let out = generate_csv(&payroll_rows(), &keys, &catalog);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "\"Yilmaz, Ayse\",2025-01");
    assert_eq!(lines[2], "\"Demir, Can\",");
    assert_eq!(lines[3], "Kaya,");
}

#[test]
fn scenario_default_then_toggled_csv() {
    let sink = Arc::new(MemorySink::new());
    let source = ExportSource::new(
        scenario_rows(),
        "people",
        scenario_catalog(),
        ReportKind::Employees,
    );
    let mut orch = ExportOrchestrator::new(source, sink.clone()).with_clock(now);

    orch.open_custom_export();
    let default_selection = orch.selection().unwrap().clone();
    assert_eq!(default_selection.keys(), ["name"]);
    assert!(orch.export_csv(Some(&default_selection)).succeeded());
    assert_eq!(last_text(&sink), "Name\nAda\nLin");

    orch.toggle_field("email");
    let toggled = orch.selection().unwrap().clone();
    assert!(orch.export_csv(Some(&toggled)).succeeded());
    assert_eq!(last_text(&sink), "Name,Email\nAda,a@x.com\nLin,");
    assert_eq!(sink.last().unwrap().filename, "people-2025-02-14.csv");
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[test]
fn workbook_header_row_matches_selection_labels() {
    let catalog = payroll_catalog();
    let selection = Selection::initialize(&catalog).toggle(&catalog, "deductions");
    let with_rows = SheetData::build(&payroll_rows(), selection.keys(), &catalog);
    let without_rows = SheetData::build(&[], selection.keys(), &catalog);

    let expected = vec!["Employee", "Gross Salary", "Deductions"];
    assert_eq!(with_rows.headers, expected);
    assert_eq!(without_rows.headers, expected);
    assert_eq!(with_rows.rows[0][2], r#"{"sgk":7280,"tax":7800}"#);
}

#[tokio::test]
async fn forced_workbook_failure_matches_csv_output_byte_for_byte() {
    let catalog = payroll_catalog();
    let selection = Selection::from_keys(&catalog, ["net", "deductions"]);

    let fallback_sink = Arc::new(MemorySink::new());
    let fallback = payroll_orchestrator(fallback_sink.clone())
        .with_workbook_engine(Arc::new(BrokenEngine))
        .export_workbook(Some(&selection))
        .await;
    assert!(matches!(fallback, ExportOutcome::FellBackToCsv { .. }));
    assert!(fallback.succeeded());

    let csv_sink = Arc::new(MemorySink::new());
    let direct = payroll_orchestrator(csv_sink.clone()).export_csv(Some(&selection));
    assert!(direct.succeeded());

    let a = fallback_sink.last().unwrap();
    let b = csv_sink.last().unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(a.filename, b.filename);
}

#[tokio::test]
async fn workbook_custom_export_delivers_xlsx() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = payroll_orchestrator(sink.clone());
    orch.open_custom_export();
    orch.toggle_field("net");

    let outcome = orch.confirm_custom_export(ExportFormat::Workbook).await.unwrap();
    assert_eq!(
        outcome,
        ExportOutcome::Downloaded {
            filename: "payroll-2025-02-14T16-05-09.xlsx".into(),
            format: ExportFormat::Workbook,
        }
    );
    assert_eq!(orch.state(), &DialogState::Closed);
    assert_eq!(&sink.last().unwrap().bytes[0..2], b"PK");
}

fn xlsx_part(bytes: &[u8], name: &str) -> String {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[tokio::test]
async fn workbook_metadata_comes_from_report_kind_and_settings() {
    let sink = Arc::new(MemorySink::new());
    let settings = ExportSettings {
        author: "Payroll Office".into(),
        subject: "January payroll".into(),
        ..ExportSettings::default()
    };
    let orch = payroll_orchestrator(sink.clone()).with_settings(settings);

    assert!(orch.export_workbook(None).await.succeeded());
    let bytes = sink.last().unwrap().bytes;

    let workbook = xlsx_part(&bytes, "xl/workbook.xml");
    assert!(workbook.contains(r#"<sheet name="Data""#));

    let core = xlsx_part(&bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>Payroll Report</dc:title>"));
    assert!(core.contains("<dc:subject>January payroll</dc:subject>"));
    assert!(core.contains("<dc:creator>Payroll Office</dc:creator>"));
    assert!(core.contains("2025-02-14T16:05:09Z</dcterms:created>"));

    let worksheet = xlsx_part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(worksheet.contains(r#"customWidth="1""#));
}

// ---------------------------------------------------------------------------
// Print
// ---------------------------------------------------------------------------

#[tokio::test]
async fn print_ignores_selection_and_uses_full_catalog() {
    let printed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let provider = RecordingProvider {
        printed: Arc::clone(&printed),
    };
    let orch = payroll_orchestrator(Arc::new(MemorySink::new()))
        .with_surface_provider(Arc::new(provider));

    let subset = Selection::initialize(&payroll_catalog());
    let outcome = orch.export_custom(ExportFormat::PrintDocument, &subset).await;
    assert!(outcome.succeeded());

    let printed = printed.lock();
    assert_eq!(printed.len(), 1);
    let doc = &printed[0];
    assert_eq!(doc.title, "Payroll Report");
    assert_eq!(doc.headers.len(), payroll_catalog().len());
    assert_eq!(doc.table_row_count(), payroll_rows().len() + 1);
    assert_eq!(doc.rows[2], vec!["Kaya", "", "", "", ""]);
}

#[test]
fn blocked_print_surface_produces_nothing() {
    let sink = Arc::new(MemorySink::new());
    let orch = payroll_orchestrator(sink.clone())
        .with_surface_provider(Arc::new(BlockedSurfaceProvider));
    let outcome = orch.export_print();
    assert_eq!(outcome, ExportOutcome::PrintAborted);
    assert!(!outcome.succeeded());
    assert!(sink.is_empty());
}

// ---------------------------------------------------------------------------
// Report kinds and sinks
// ---------------------------------------------------------------------------

#[test]
fn payroll_title_is_fixed() {
    let kind: ReportKind = "payroll".parse().unwrap();
    assert_eq!(kind.title(), "Payroll Report");
    let orch = payroll_orchestrator(Arc::new(MemorySink::new()));
    assert_eq!(orch.title(), "Payroll Report");
}

#[test]
fn directory_sink_failure_is_reported_not_raised() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let source = ExportSource::new(scenario_rows(), "people", scenario_catalog(), ReportKind::Leaves);
    let orch = ExportOrchestrator::new(source, Arc::new(DirectorySink::new(&blocker))).with_clock(now);

    let outcome = orch.export_csv(None);
    assert!(matches!(
        outcome,
        ExportOutcome::Failed {
            format: ExportFormat::DelimitedText,
            ..
        }
    ));
}

#[test]
fn directory_sink_receives_csv_file() {
    let tmp = tempfile::tempdir().unwrap();
    let source = ExportSource::new(scenario_rows(), "people", scenario_catalog(), ReportKind::Leaves);
    let orch =
        ExportOrchestrator::new(source, Arc::new(DirectorySink::new(tmp.path()))).with_clock(now);

    assert!(orch.export_csv(None).succeeded());
    let written = std::fs::read_to_string(tmp.path().join("people-2025-02-14.csv")).unwrap();
    assert_eq!(written, "Name,Email\nAda,a@x.com\nLin,");
}
