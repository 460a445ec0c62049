//! Command-line arguments for `hrdash`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hrdash_export::ExportFormat;

/// Export HR report data to CSV, xlsx or a printable PDF.
#[derive(Parser, Debug)]
#[command(name = "hrdash", version)]
pub struct CliArgs {
    /// Configuration file path (defaults to ~/.hrdash/config.json)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the fields of a catalog and mark the required ones
    Fields {
        /// JSON catalog: [{"key", "label", "required"}]
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,
    },

    /// Print the report title for every known report kind
    Titles,

    /// Export a dataset
    Export {
        /// Rows as a JSON array of objects or a CSV file with a header row
        #[arg(long, value_name = "FILE")]
        rows: PathBuf,

        /// JSON catalog describing the exportable fields
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,

        /// Report kind (employees, leaves, payroll, performance, dashboard, ...)
        #[arg(long, default_value = "dashboard")]
        kind: String,

        /// Filename stem; the date or timestamp is appended
        #[arg(long, default_value = "report")]
        stem: String,

        /// Output format: csv, xlsx or print
        #[arg(long, short = 'f', default_value = "csv", value_parser = parse_format)]
        format: ExportFormat,

        /// Optional fields to include, comma separated. Required fields are
        /// always exported; without this flag the whole catalog is used.
        #[arg(long, value_delimiter = ',', value_name = "KEYS")]
        fields: Option<Vec<String>>,

        /// Output directory (overrides the configured one)
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|e: hrdash_export::ExportError| e.to_string())
}
