//! The streaming fold over survey rows.
//!
//! One forward pass, no look-ahead: each row is parsed, classified and
//! folded into its sector (and location) aggregate. A row that fails
//! validation is skipped on its own; the scan never aborts for a bad row.

use chrono::Datelike;
use std::collections::HashMap;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::normalize::extract_keywords;
use crate::parsers::{DEFAULT_HOUR, parse_date, parse_hour, parse_rating};
use crate::pipeline::relevance::is_relevant;
use crate::pipeline::types::{RetainedComment, SectorAggregate};
use crate::schema::ColumnMap;
use crate::sheet::CellValue;

/// Name used when a row has no sector or location cell.
pub const DEFAULT_NAME: &str = "General";

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Streaming accumulator over data rows. Sectors are created lazily and
/// kept in discovery order.
pub struct Accumulator<'a> {
    cfg: &'a PipelineConfig,
    sectors: Vec<SectorAggregate>,
    index: HashMap<String, usize>,
    rows_kept: usize,
    rows_skipped: usize,
}

impl<'a> Accumulator<'a> {
    pub fn new(cfg: &'a PipelineConfig) -> Self {
        Accumulator {
            cfg,
            sectors: Vec::new(),
            index: HashMap::new(),
            rows_kept: 0,
            rows_skipped: 0,
        }
    }

    pub fn rows_kept(&self) -> usize {
        self.rows_kept
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Folds one data row into the aggregates. Returns whether the row was
    /// counted; rows failing rating or date validation are skipped.
    pub fn push_row(&mut self, row: &[CellValue], cols: &ColumnMap) -> bool {
        // Fully blank rows (trailing padding in most exports) are ignored
        // without counting as skips.
        if row.iter().all(CellValue::is_empty) {
            return false;
        }

        let Some(rating) = parse_rating(cell(row, cols.rating)) else {
            debug!(?row, "row skipped: unmappable rating");
            self.rows_skipped += 1;
            return false;
        };
        let Some(date) = parse_date(cell(row, cols.date)) else {
            debug!(?row, "row skipped: invalid date");
            self.rows_skipped += 1;
            return false;
        };
        let hour = cols
            .time
            .map(|c| parse_hour(cell(row, c)))
            .unwrap_or(DEFAULT_HOUR) as usize;

        let sector_name = name_or_default(row, cols.sector);
        let location_name = name_or_default(row, cols.location);
        let comment = cols
            .comment
            .map(|c| cell(row, c).to_display_string())
            .unwrap_or_default();

        let month = date.month0() as usize;
        let negative = rating <= 2;

        let cfg = self.cfg;
        let agg = self.sector_mut(&sector_name);
        agg.months[month].record(rating);
        agg.hours[hour].total += 1;
        if negative {
            agg.hours[hour].negative += 1;
        }

        let loc = agg.locations.entry(location_name).or_default();
        loc.counts.record(rating);
        loc.hours[hour].total += 1;
        if negative {
            loc.hours[hour].negative += 1;
        }

        if !comment.is_empty() && is_relevant(&comment, &sector_name, cfg) {
            let keywords = extract_keywords(&comment, &cfg.stop_words, cfg.min_token_len);
            let retained = RetainedComment {
                text: comment,
                day: date.day(),
                month,
                hour: hour as u32,
            };
            if rating >= 3 {
                agg.positive_keywords.extend(keywords);
                agg.positive_comments.push(retained);
            } else {
                agg.negative_keywords.extend(keywords);
                agg.negative_comments.push(retained);
            }
        }

        self.rows_kept += 1;
        true
    }

    /// Hands the per-sector state over for finalization, discovery order
    /// preserved.
    pub fn into_sectors(self) -> Vec<SectorAggregate> {
        self.sectors
    }

    fn sector_mut(&mut self, name: &str) -> &mut SectorAggregate {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.sectors.push(SectorAggregate::new(name));
                let idx = self.sectors.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.sectors[idx]
    }
}

fn cell<'r>(row: &'r [CellValue], idx: usize) -> &'r CellValue {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

fn name_or_default(row: &[CellValue], col: Option<usize>) -> String {
    let name = col
        .map(|c| cell(row, c).to_display_string())
        .unwrap_or_default();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue::{Empty, Number, Text};

    fn cols() -> ColumnMap {
        ColumnMap {
            date: 0,
            time: Some(1),
            sector: Some(2),
            location: Some(3),
            rating: 4,
            comment: Some(5),
            header_row: 0,
        }
    }

    fn row(date: &str, hour: &str, sector: &str, location: &str, rating: f64, comment: &str) -> Vec<CellValue> {
        vec![
            Text(date.to_string()),
            Text(hour.to_string()),
            Text(sector.to_string()),
            Text(location.to_string()),
            Number(rating),
            Text(comment.to_string()),
        ]
    }

    #[test]
    fn test_accumulates_month_hour_and_location() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);

        assert!(acc.push_row(&row("10/01/2025", "14:00", "Cajas", "Caja 1", 4.0, ""), &cols()));
        assert!(acc.push_row(&row("15/01/2025", "14:00", "Cajas", "Caja 2", 1.0, ""), &cols()));

        let sectors = acc.into_sectors();
        assert_eq!(sectors.len(), 1);
        let s = &sectors[0];
        assert_eq!(s.name, "Cajas");
        assert_eq!(s.months[0].total, 2);
        assert_eq!(s.months[0].very_positive, 1);
        assert_eq!(s.months[0].very_negative, 1);
        assert_eq!(s.hours[14].total, 2);
        assert_eq!(s.hours[14].negative, 1);
        assert_eq!(s.locations.len(), 2);
        assert_eq!(s.locations["Caja 1"].counts.total, 1);
        assert_eq!(s.locations["Caja 2"].hours[14].negative, 1);
    }

    #[test]
    fn test_bucket_totals_stay_consistent() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);
        for (i, r) in [4.0, 3.0, 3.0, 2.0, 1.0].iter().enumerate() {
            acc.push_row(
                &row(&format!("{:02}/03/2025", i + 1), "10:00", "Cajas", "", *r, ""),
                &cols(),
            );
        }
        let s = &acc.into_sectors()[0];
        let m = &s.months[2];
        assert_eq!(
            m.total,
            m.very_positive + m.positive + m.negative + m.very_negative
        );
    }

    #[test]
    fn test_bad_rows_are_skipped_not_fatal() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);

        assert!(!acc.push_row(&row("10/01/2025", "14:00", "Cajas", "", f64::NAN, ""), &cols()));
        assert!(!acc.push_row(&row("no es fecha", "14:00", "Cajas", "", 4.0, ""), &cols()));
        assert!(acc.push_row(&row("10/01/2025", "14:00", "Cajas", "", 4.0, ""), &cols()));

        assert_eq!(acc.rows_kept(), 1);
        assert_eq!(acc.rows_skipped(), 2);
    }

    #[test]
    fn test_blank_rows_not_counted_as_skips() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);
        assert!(!acc.push_row(&vec![Empty, Empty, Empty], &cols()));
        assert_eq!(acc.rows_skipped(), 0);
    }

    #[test]
    fn test_missing_names_default_to_general() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);
        acc.push_row(&vec![Text("10/01/2025".to_string()), Empty, Empty, Empty, Number(3.0)], &cols());
        let sectors = acc.into_sectors();
        assert_eq!(sectors[0].name, DEFAULT_NAME);
        assert!(sectors[0].locations.contains_key(DEFAULT_NAME));
    }

    #[test]
    fn test_relevant_comment_lands_on_right_sentiment() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);
        acc.push_row(
            &row(
                "10/01/2025",
                "14:00",
                "Cajas",
                "",
                4.0,
                "La atencion en caja fue muy rapida y amable",
            ),
            &cols(),
        );
        acc.push_row(
            &row(
                "15/01/2025",
                "14:00",
                "Cajas",
                "",
                1.0,
                "mucha fila en caja, tarde mucho",
            ),
            &cols(),
        );

        let s = &acc.into_sectors()[0];
        assert_eq!(s.positive_comments.len(), 1);
        assert_eq!(s.negative_comments.len(), 1);
        assert!(s.positive_keywords.contains(&"rapida".to_string()));
        assert!(s.positive_keywords.contains(&"amable".to_string()));
        assert!(s.negative_keywords.contains(&"fila".to_string()));
        assert!(s.negative_keywords.contains(&"tarde".to_string()));
        assert_eq!(s.negative_comments[0].day, 15);
        assert_eq!(s.negative_comments[0].hour, 14);
    }

    #[test]
    fn test_irrelevant_comment_still_counts_the_row() {
        let cfg = PipelineConfig::default();
        let mut acc = Accumulator::new(&cfg);
        acc.push_row(&row("10/01/2025", "9:00", "Cajas", "", 3.0, "ok"), &cols());
        let s = &acc.into_sectors()[0];
        assert_eq!(s.months[0].total, 1);
        assert!(s.positive_comments.is_empty());
    }
}
