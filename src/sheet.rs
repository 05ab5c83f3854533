//! Workbook access layer.
//!
//! Everything Excel-specific stays behind this module: the raw upload buffer
//! is opened with calamine, only the first worksheet is read, and each cell
//! is converted once into [`CellValue`] so the rest of the pipeline never
//! sees a spreadsheet cell type.

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDateTime;
use std::io::Cursor;

use crate::error::PipelineError;

/// A spreadsheet cell reduced to the shapes the value parsers understand.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Header and free-text reads: the textual content of the cell, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Best-effort string rendering used for sector and location names.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => CellValue::DateTime(naive),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// The first worksheet of an uploaded workbook.
pub struct Worksheet {
    range: Range<Data>,
}

impl Worksheet {
    /// Opens a workbook from an in-memory buffer and materializes the cell
    /// range of its first sheet. Rows are then iterated lazily off the range.
    /// The buffer is read through a borrowing cursor, never copied.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let cursor = Cursor::new(bytes);
        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| PipelineError::Workbook(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PipelineError::Workbook("workbook has no sheets".to_string()))?
            .map_err(|e| PipelineError::Workbook(e.to_string()))?;

        Ok(Worksheet { range })
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<CellValue>> + '_ {
        self.range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_is_not_a_workbook() {
        let result = Worksheet::from_bytes(&[]);
        assert!(matches!(result, Err(PipelineError::Workbook(_))));
    }

    #[test]
    fn test_cell_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("   ".to_string()).is_empty());
        assert!(!CellValue::Text("x".to_string()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_display_string_trims_and_formats() {
        assert_eq!(CellValue::Text(" Cajas ".to_string()).to_display_string(), "Cajas");
        assert_eq!(CellValue::Number(3.0).to_display_string(), "3");
        assert_eq!(CellValue::Empty.to_display_string(), "");
    }
}
