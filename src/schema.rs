//! Header detection over loosely structured survey sheets.
//!
//! Exports rarely put the header on the first row (cover titles, blank rows
//! and merged cells come first), so the detector scans a small window of
//! rows and matches normalized cell text against the configured keyword
//! sets. The rating column needs the priority rules because most exports
//! carry both a numeric "calificacion" column and a textual
//! "calificacion_descripcion" column, and plain substring matching picks
//! whichever comes first.

use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::normalize::normalize;
use crate::sheet::{CellValue, Worksheet};

/// Column indices resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub rating: usize,
    pub time: Option<usize>,
    pub sector: Option<usize>,
    pub location: Option<usize>,
    pub comment: Option<usize>,
    /// Row index of the detected header; data starts on the next row.
    pub header_row: usize,
}

/// Scans the first rows of the sheet for the survey columns.
///
/// Keeps the first column matching each keyword set; for the rating column
/// the highest-priority rule match wins, first-found on ties. Scanning stops
/// early once a date column and a rating column with priority >= 2 are both
/// known. Fails naming the missing column(s) when date or rating cannot be
/// resolved at any priority.
pub fn detect_columns(
    sheet: &Worksheet,
    cfg: &PipelineConfig,
) -> Result<ColumnMap, PipelineError> {
    detect_columns_in(sheet.rows().take(cfg.header_scan_rows), cfg)
}

/// Row-iterator form of [`detect_columns`], shared with tests that build
/// rows in memory.
pub fn detect_columns_in<I>(rows: I, cfg: &PipelineConfig) -> Result<ColumnMap, PipelineError>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let kw = &cfg.headers;

    let mut date = None;
    let mut time = None;
    let mut sector = None;
    let mut location = None;
    let mut comment = None;
    let mut rating: Option<usize> = None;
    let mut rating_priority: u8 = 0;
    let mut header_row = 0;

    for (row_idx, row) in rows.into_iter().take(cfg.header_scan_rows).enumerate() {
        for (col, cell) in row.iter().enumerate() {
            let Some(text) = cell.as_text() else { continue };
            let norm = normalize(text);
            if norm.is_empty() {
                continue;
            }

            let contains_any = |terms: &[String]| terms.iter().any(|t| norm.contains(t.as_str()));

            if date.is_none() && contains_any(&kw.date) {
                date = Some(col);
                header_row = row_idx;
            }
            if time.is_none() && contains_any(&kw.time) {
                time = Some(col);
            }
            if sector.is_none() && contains_any(&kw.sector) {
                sector = Some(col);
            }
            if location.is_none() && contains_any(&kw.location) {
                location = Some(col);
            }
            if comment.is_none() && contains_any(&kw.comment) {
                comment = Some(col);
            }

            let cell_priority = kw
                .rating_rules
                .iter()
                .filter(|r| r.matches(&norm))
                .map(|r| r.priority)
                .max()
                .unwrap_or(0);
            if cell_priority > rating_priority {
                rating = Some(col);
                rating_priority = cell_priority;
                header_row = row_idx;
            }
        }

        if date.is_some() && rating_priority >= 2 {
            header_row = row_idx;
            break;
        }
    }

    match (date, rating) {
        (Some(date), Some(rating)) => {
            let map = ColumnMap {
                date,
                rating,
                time,
                sector,
                location,
                comment,
                header_row,
            };
            debug!(?map, rating_priority, "header detected");
            Ok(map)
        }
        (date, rating) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push("fecha");
            }
            if rating.is_none() {
                missing.push("calificacion");
            }
            Err(PipelineError::SchemaDetection {
                missing: missing.join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.to_string())
                }
            })
            .collect()
    }

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_detects_all_columns_on_first_row() {
        let rows = vec![header(&[
            "Fecha",
            "Hora",
            "Sector",
            "Ubicación",
            "Calificación",
            "Comentario",
        ])];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.date, 0);
        assert_eq!(map.time, Some(1));
        assert_eq!(map.sector, Some(2));
        assert_eq!(map.location, Some(3));
        assert_eq!(map.rating, 4);
        assert_eq!(map.comment, Some(5));
        assert_eq!(map.header_row, 0);
    }

    #[test]
    fn test_prefers_rating_over_rating_description() {
        // Description column appears first; priority must still pick the
        // plain rating column.
        let rows = vec![header(&[
            "Fecha",
            "Calificación Descripción",
            "Calificación",
        ])];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.rating, 2);
    }

    #[test]
    fn test_description_only_column_still_resolves() {
        let rows = vec![header(&["Fecha", "calificacion_descripcion"])];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.rating, 1);
    }

    #[test]
    fn test_header_on_later_row() {
        let rows = vec![
            header(&["Encuesta Anual 2025"]),
            header(&[""]),
            header(&["Fecha", "Hora", "Sector", "Calificación", "Comentario"]),
        ];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.header_row, 2);
        assert_eq!(map.date, 0);
        assert_eq!(map.rating, 3);
    }

    #[test]
    fn test_nota_and_puntos_fallbacks() {
        let rows = vec![header(&["Fecha", "Nota"])];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.rating, 1);

        let rows = vec![header(&["Fecha", "Puntos Criticos", "Puntos"])];
        let map = detect_columns_in(rows, &cfg()).unwrap();
        assert_eq!(map.rating, 2);
    }

    #[test]
    fn test_missing_columns_are_named() {
        let rows = vec![header(&["Sector", "Comentario"])];
        let err = detect_columns_in(rows, &cfg()).unwrap_err();
        match err {
            PipelineError::SchemaDetection { missing } => {
                assert!(missing.contains("fecha"));
                assert!(missing.contains("calificacion"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let mut rows = vec![header(&["x"]); 6];
        rows.push(header(&["Fecha", "Calificación"]));
        let err = detect_columns_in(rows, &cfg()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaDetection { .. }));
    }
}
