//! Output formatting and persistence for sector reports.
//!
//! Supports the JSON report envelope the front-end consumes and a flat
//! per-sector-month CSV export.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::pipeline::types::SectorReport;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Envelope the boundary caller receives on success.
#[derive(Serialize)]
pub struct ReportEnvelope<'a> {
    pub success: bool,
    pub sectors: &'a [SectorReport],
}

/// Serializes the report envelope to a JSON string.
pub fn render_json(reports: &[SectorReport], pretty: bool) -> Result<String> {
    let envelope = ReportEnvelope {
        success: true,
        sectors: reports,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    Ok(json)
}

/// Writes the JSON report envelope to a file.
pub fn write_report(path: &str, reports: &[SectorReport], pretty: bool) -> Result<()> {
    std::fs::write(path, render_json(reports, pretty)?)?;
    Ok(())
}

/// One row of the monthly CSV export.
#[derive(Serialize)]
struct MonthlyRecord<'a> {
    sector: &'a str,
    month: &'a str,
    satisfaction_index: f64,
    total_responses: u32,
}

/// Appends one CSV row per sector-month to a file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_monthly_csv(path: &str, reports: &[SectorReport]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending monthly CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for report in reports {
        for month in &report.months {
            writer.serialize(MonthlyRecord {
                sector: &report.name,
                month: &month.month,
                satisfaction_index: month.satisfaction_index,
                total_responses: month.total_responses,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}
