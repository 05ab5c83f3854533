//! CLI entry point for the satisfaction survey analyzer.
//!
//! Stands in for the upload boundary: reads one workbook, optionally merges
//! manually entered monthly figures, runs the pipeline and writes the
//! per-sector report as JSON or a monthly CSV.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use satisfaction_rater::{
    config::PipelineConfig,
    output::{append_monthly_csv, write_report},
    pipeline::process_workbook,
    pipeline::types::ManualOverrides,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "satisfaction_rater")]
#[command(about = "Annual satisfaction survey analytics over spreadsheet exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a survey workbook and write the per-sector JSON report
    Analyze {
        /// Path to the .xlsx/.xls workbook
        #[arg(value_name = "FILE")]
        source: String,

        /// JSON file with manually entered monthly figures
        #[arg(short, long)]
        manual: Option<String>,

        /// Report file to write
        #[arg(short, long, default_value = "report.json")]
        output: String,

        /// Pretty-print the JSON report
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Analyze a workbook and append per-sector monthly rows to a CSV
    ExportCsv {
        /// Path to the .xlsx/.xls workbook
        #[arg(value_name = "FILE")]
        source: String,

        /// JSON file with manually entered monthly figures
        #[arg(short, long)]
        manual: Option<String>,

        /// CSV file to append results to
        #[arg(short, long, default_value = "monthly.csv")]
        output: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/satisfaction_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("satisfaction_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let cfg = PipelineConfig::from_env();

    match cli.command {
        Commands::Analyze {
            source,
            manual,
            output,
            pretty,
        } => {
            let reports = run_pipeline(&source, manual.as_deref(), &cfg)?;
            write_report(&output, &reports, pretty)?;
            info!(output = %output, sectors = reports.len(), "report written");
        }
        Commands::ExportCsv {
            source,
            manual,
            output,
        } => {
            let reports = run_pipeline(&source, manual.as_deref(), &cfg)?;
            append_monthly_csv(&output, &reports)?;
            info!(output = %output, sectors = reports.len(), "monthly CSV written");
        }
    }

    Ok(())
}

/// Reads the workbook and overrides from disk and runs the pipeline,
/// logging a one-line summary per sector.
#[tracing::instrument(skip(cfg), fields(source = %source))]
fn run_pipeline(
    source: &str,
    manual: Option<&str>,
    cfg: &PipelineConfig,
) -> Result<Vec<satisfaction_rater::pipeline::types::SectorReport>> {
    let bytes = std::fs::read(source).with_context(|| format!("reading {source}"))?;
    let overrides = load_overrides(manual)?;

    let reports = match process_workbook(&bytes, &overrides, cfg) {
        Ok(reports) => reports,
        Err(e) => {
            error!(error = %e, "processing failed");
            return Err(e.into());
        }
    };

    for report in &reports {
        info!(
            sector = %report.name,
            annual_satisfaction = report.annual_satisfaction,
            locations = report.locations.len(),
            critical_hour = %report.critical_hour.hour,
            "sector summary"
        );
    }

    Ok(reports)
}

fn load_overrides(path: Option<&str>) -> Result<ManualOverrides> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            let overrides: ManualOverrides =
                serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
            Ok(overrides)
        }
        None => Ok(ManualOverrides::default()),
    }
}
