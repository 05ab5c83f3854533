//! The ingestion-and-aggregation pipeline.
//!
//! One uploaded workbook produces one synchronous scan: schema detection
//! over the header window, a streaming fold over every data row, then a
//! finalization pass per sector. All state is request-scoped; nothing is
//! shared across calls.

pub mod accumulate;
pub mod finalize;
pub mod relevance;
pub mod types;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::schema::{ColumnMap, detect_columns};
use crate::sheet::{CellValue, Worksheet};
use self::accumulate::Accumulator;
use self::finalize::finalize_sector;
use self::types::{ManualOverrides, SectorReport};

/// Runs the full pipeline over a raw workbook buffer.
///
/// Reads the first worksheet only. Fails fast on an empty or oversized
/// buffer, an unreadable workbook, undetectable required columns, or a scan
/// where no row validates.
#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
pub fn process_workbook(
    bytes: &[u8],
    overrides: &ManualOverrides,
    cfg: &PipelineConfig,
) -> Result<Vec<SectorReport>, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::MissingFile);
    }
    if bytes.len() > cfg.max_upload_bytes {
        return Err(PipelineError::TooLarge {
            size: bytes.len(),
            limit: cfg.max_upload_bytes,
        });
    }

    let sheet = Worksheet::from_bytes(bytes)?;
    let cols = detect_columns(&sheet, cfg)?;
    process_rows(sheet.rows().skip(cols.header_row + 1), &cols, overrides, cfg)
}

/// Runs the scan and finalization over already-detected rows.
///
/// Exposed separately so callers (and tests) can drive the pipeline with
/// rows built in memory.
pub fn process_rows<I>(
    rows: I,
    cols: &ColumnMap,
    overrides: &ManualOverrides,
    cfg: &PipelineConfig,
) -> Result<Vec<SectorReport>, PipelineError>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let mut acc = Accumulator::new(cfg);
    for row in rows {
        acc.push_row(&row, cols);
    }

    if acc.rows_kept() == 0 {
        return Err(PipelineError::EmptyResult);
    }

    info!(
        rows_kept = acc.rows_kept(),
        rows_skipped = acc.rows_skipped(),
        "scan complete"
    );

    let reports: Vec<SectorReport> = acc
        .into_sectors()
        .into_iter()
        .map(|agg| finalize_sector(agg, overrides, cfg))
        .collect();

    info!(sectors = reports.len(), "reports finalized");
    Ok(reports)
}
