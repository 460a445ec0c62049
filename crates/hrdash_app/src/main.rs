mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};

use hrdash_core::HrdashConfig;
use hrdash_core::logging;
use hrdash_export::row::load_rows;
use hrdash_export::{
    DirectorySink, ExportFormat, ExportOrchestrator, ExportOutcome, ExportSettings, ExportSource,
    FieldCatalog, ReportKind,
};

use cli::{CliArgs, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();

    let config = match &args.config_file {
        Some(path) => HrdashConfig::load_from_path(path)?,
        None => HrdashConfig::load()?,
    };

    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = logging::init_logging(level)
        .inspect_err(|e| eprintln!("Logging disabled: {e}"))
        .ok();

    match args.command {
        Commands::Fields { catalog } => list_fields(&catalog),
        Commands::Titles => {
            for kind in ReportKind::known() {
                println!("{:<12} {}", kind.as_str(), kind.title());
            }
            println!("{:<12} {}", "(other)", ReportKind::Other(String::new()).title());
            Ok(())
        }
        Commands::Export {
            rows,
            catalog,
            kind,
            stem,
            format,
            fields,
            out,
        } => {
            let request = ExportRequest {
                rows,
                catalog,
                kind,
                stem,
                format,
                fields,
                out,
            };
            export(&config, request).await
        }
    }
}

fn list_fields(path: &Path) -> Result<()> {
    let catalog = FieldCatalog::load(path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    for field in catalog.fields() {
        let marker = if field.required { "*" } else { " " };
        println!("{marker} {:<20} {}", field.key, field.label);
    }
    Ok(())
}

struct ExportRequest {
    rows: PathBuf,
    catalog: PathBuf,
    kind: String,
    stem: String,
    format: ExportFormat,
    fields: Option<Vec<String>>,
    out: Option<PathBuf>,
}

async fn export(config: &HrdashConfig, request: ExportRequest) -> Result<()> {
    let catalog = FieldCatalog::load(&request.catalog)
        .with_context(|| format!("Failed to load catalog {}", request.catalog.display()))?;
    let rows = load_rows(&request.rows)
        .with_context(|| format!("Failed to load rows {}", request.rows.display()))?;
    let kind: ReportKind = request.kind.parse()?;
    debug!(
        "Loaded {} rows and {} catalog fields for {kind}",
        rows.len(),
        catalog.len()
    );

    let out_dir = match request.out {
        Some(dir) => dir,
        None => config.exports_dir()?,
    };
    let settings = ExportSettings {
        author: config.author.clone(),
        subject: config.subject.clone(),
        column_width: config.column_width,
        print_date_format: config.print_date_format.clone(),
    };

    let source = ExportSource::new(rows, request.stem, catalog, kind);
    let mut orchestrator =
        ExportOrchestrator::new(source, Arc::new(DirectorySink::new(&out_dir))).with_settings(settings);

    let outcome = match request.fields {
        None => match request.format {
            ExportFormat::DelimitedText => orchestrator.export_csv(None),
            ExportFormat::Workbook => orchestrator.export_workbook(None).await,
            ExportFormat::PrintDocument => orchestrator.export_print(),
        },
        Some(keys) => {
            orchestrator.open_custom_export();
            for key in &keys {
                if !orchestrator.source().catalog.contains(key) {
                    bail!("Unknown field `{key}`");
                }
                // Required fields are already selected; toggling them again is a no-op.
                if !orchestrator.selection().is_some_and(|s| s.contains(key)) {
                    orchestrator.toggle_field(key);
                }
            }
            match orchestrator.confirm_custom_export(request.format).await {
                Some(outcome) => outcome,
                None => bail!("No fields selected"),
            }
        }
    };

    report(&outcome, &out_dir)
}

fn report(outcome: &ExportOutcome, out_dir: &Path) -> Result<()> {
    match outcome {
        ExportOutcome::Downloaded { filename, .. } => {
            println!("{}", out_dir.join(filename).display());
        }
        ExportOutcome::FellBackToCsv { filename, reason } => {
            eprintln!("Workbook unavailable ({reason}); wrote CSV instead");
            println!("{}", out_dir.join(filename).display());
        }
        ExportOutcome::Printed { document_name } => {
            println!("{}", out_dir.join(format!("{document_name}.pdf")).display());
        }
        ExportOutcome::PrintAborted => {
            info!("Print surface unavailable");
        }
        ExportOutcome::EmptySelection => bail!("No fields selected"),
        ExportOutcome::Failed { format, message } => bail!("{format} export failed: {message}"),
    }
    Ok(())
}
