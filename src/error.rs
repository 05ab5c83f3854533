//! Error taxonomy for the survey processing pipeline.
//!
//! File- and schema-level problems abort the whole request; row-level
//! problems are handled inside the accumulator (skip and continue) and
//! never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// No upload buffer was provided at all.
    #[error("no spreadsheet data provided")]
    MissingFile,

    /// The upload exceeds the configured size limit.
    #[error("spreadsheet of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// The buffer could not be opened as a workbook, or it has no sheets.
    #[error("could not read workbook: {0}")]
    Workbook(String),

    /// Required columns were not found within the header scan window.
    #[error("required columns not found: {missing}")]
    SchemaDetection { missing: String },

    /// The schema was detected but no row survived validation. Usually a
    /// date or rating format mismatch rather than a truly empty sheet.
    #[error("no valid rows found; check the date and rating column formats")]
    EmptyResult,
}
