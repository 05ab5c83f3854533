//! Value parsers for the three survey fields that arrive in wildly mixed
//! shapes: dates, times of day and ratings.
//!
//! Exports from the survey kiosk alternate between native Excel date cells,
//! raw serial numbers and `DD/MM/YYYY` text depending on who produced the
//! file, so each parser tries the encodings in a fixed order and gives up
//! explicitly instead of emitting an invalid value.

use chrono::{DateTime, NaiveDate, Timelike};

use crate::normalize::normalize;
use crate::sheet::CellValue;

/// Hour assumed when a row has no usable time cell.
pub const DEFAULT_HOUR: u32 = 12;

/// Unix epoch expressed as an Excel serial day (1899-12-30 based).
const EXCEL_UNIX_EPOCH: f64 = 25569.0;

/// Largest serial Excel itself can represent (9999-12-31).
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// Parses a calendar date from a cell.
///
/// Accepts, in order: a native date cell, an Excel serial day count, text in
/// day-first `DD/MM/YYYY` or `DD-MM-YYYY` form (a trailing time component is
/// ignored, two-digit years map to 2000+), and ISO `YYYY-MM-DD` text.
/// Returns `None` when no interpretation yields a valid calendar date.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(serial) => date_from_serial(*serial),
        CellValue::Text(s) => date_from_text(s),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH) * 86_400.0 * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

fn date_from_text(raw: &str) -> Option<NaiveDate> {
    // "15/03/2024 14:30" -> "15/03/2024"
    let date_part = raw.trim().split_whitespace().next()?;

    let sep = if date_part.contains('/') {
        Some('/')
    } else if date_part.contains('-') {
        Some('-')
    } else {
        None
    };

    if let Some(sep) = sep {
        let parts: Vec<&str> = date_part.split(sep).collect();
        if parts.len() == 3 {
            // A four-digit first segment is year-first; anything else is
            // read day-first, the convention of the survey exports.
            let parsed = if parts[0].len() == 4 {
                ymd(parts[0], parts[1], parts[2])
            } else {
                ymd(parts[2], parts[1], parts[0])
            };
            if parsed.is_some() {
                return parsed;
            }
        }
    }

    // Generic fallbacks for anything the split logic did not cover.
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .ok()
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let mut year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses an hour of day, always returning a value in `[0, 23]`.
///
/// Native time cells yield their hour; a numeric cell is read as an Excel
/// fractional day (`floor(v * 24)`, clamped); text is read from the segment
/// before the first `:`. Anything unusable falls back to [`DEFAULT_HOUR`].
pub fn parse_hour(cell: &CellValue) -> u32 {
    match cell {
        CellValue::DateTime(dt) => dt.hour(),
        CellValue::Number(v) => {
            if !v.is_finite() {
                return DEFAULT_HOUR;
            }
            (v * 24.0).floor().clamp(0.0, 23.0) as u32
        }
        CellValue::Text(s) => s
            .split(':')
            .next()
            .and_then(|h| h.trim().parse::<i64>().ok())
            .map(|h| h.clamp(0, 23) as u32)
            .unwrap_or(DEFAULT_HOUR),
        CellValue::Empty | CellValue::Bool(_) => DEFAULT_HOUR,
    }
}

/// A rating as it appears in the sheet, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRating {
    Numeric(f64),
    Label(String),
}

impl RawRating {
    /// Resolves the raw value into the canonical `1..=4` scale.
    ///
    /// Numeric values are truncated and clamped; labels are matched against
    /// the sentiment wording used by the kiosk, most specific first so that
    /// "muy positiva" never falls through to "positiva".
    pub fn resolve(&self) -> Option<u8> {
        match self {
            RawRating::Numeric(n) => {
                if !n.is_finite() {
                    return None;
                }
                Some((*n as i64).clamp(1, 4) as u8)
            }
            RawRating::Label(label) => {
                let norm = normalize(label);
                if norm.is_empty() {
                    return None;
                }
                if let Ok(n) = norm.parse::<i64>() {
                    return Some(n.clamp(1, 4) as u8);
                }
                if norm.contains("muy positiva") || norm.contains("excelente") {
                    Some(4)
                } else if norm.contains("muy negativa")
                    || norm.contains("muy mala")
                    || norm.contains("pesima")
                {
                    Some(1)
                } else if norm.contains("positiva") || norm.contains("buena") {
                    Some(3)
                } else if norm.contains("negativa")
                    || norm.contains("mala")
                    || norm.contains("regular")
                {
                    Some(2)
                } else {
                    None
                }
            }
        }
    }
}

/// Parses a rating cell into the canonical `1..=4` scale, or `None` when the
/// value maps to no rating at all (the caller discards the row).
pub fn parse_rating(cell: &CellValue) -> Option<u8> {
    let raw = match cell {
        CellValue::Number(n) => RawRating::Numeric(*n),
        CellValue::Text(s) => RawRating::Label(s.clone()),
        CellValue::Empty | CellValue::Bool(_) | CellValue::DateTime(_) => return None,
    };
    raw.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDateTime};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_parse_date_native_cell_passes_through() {
        let dt: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(
            parse_date(&CellValue::DateTime(dt)),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_parse_date_day_first_text() {
        let d = parse_date(&text("15/03/2024")).unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (15, 3, 2024));

        let d = parse_date(&text("15-03-2024")).unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (15, 3, 2024));
    }

    #[test]
    fn test_parse_date_strips_trailing_time() {
        let d = parse_date(&text("15/03/2024 14:30")).unwrap();
        assert_eq!((d.day(), d.month()), (15, 3));
    }

    #[test]
    fn test_parse_date_two_digit_year() {
        let d = parse_date(&text("01/02/24")).unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (1, 2, 2024));
    }

    #[test]
    fn test_parse_date_iso_text() {
        let d = parse_date(&text("2024-03-15")).unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (15, 3, 2024));
    }

    #[test]
    fn test_parse_date_excel_serial() {
        // Serial 45000 is 2023-03-15 with the 1899-12-30 epoch.
        let d = parse_date(&CellValue::Number(45000.0)).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2023, 3, 15));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(&text("no es una fecha")), None);
        assert_eq!(parse_date(&text("99/99/2024")), None);
        assert_eq!(parse_date(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_parse_hour_fractional_day() {
        // 14:30 as an Excel fraction of a day.
        assert_eq!(parse_hour(&CellValue::Number(0.604_166_7)), 14);
        assert_eq!(parse_hour(&CellValue::Number(0.0)), 0);
    }

    #[test]
    fn test_parse_hour_clamps_out_of_range_numeric() {
        // floor(1.5 * 24) = 36, clamped into the valid range.
        assert_eq!(parse_hour(&CellValue::Number(1.5)), 23);
        assert_eq!(parse_hour(&CellValue::Number(-0.5)), 0);
    }

    #[test]
    fn test_parse_hour_text_and_default() {
        assert_eq!(parse_hour(&text("14:30")), 14);
        assert_eq!(parse_hour(&text("9")), 9);
        assert_eq!(parse_hour(&text("99:00")), 23);
        assert_eq!(parse_hour(&text("mediodia")), DEFAULT_HOUR);
        assert_eq!(parse_hour(&CellValue::Empty), DEFAULT_HOUR);
    }

    #[test]
    fn test_parse_rating_numeric() {
        assert_eq!(parse_rating(&CellValue::Number(4.0)), Some(4));
        assert_eq!(parse_rating(&text("3")), Some(3));
        // Out-of-scale numerics clamp rather than fail.
        assert_eq!(parse_rating(&CellValue::Number(7.0)), Some(4));
        assert_eq!(parse_rating(&CellValue::Number(0.0)), Some(1));
    }

    #[test]
    fn test_parse_rating_labels() {
        assert_eq!(parse_rating(&text("Muy Positiva")), Some(4));
        assert_eq!(parse_rating(&text("Excelente")), Some(4));
        assert_eq!(parse_rating(&text("Positiva")), Some(3));
        assert_eq!(parse_rating(&text("Buena")), Some(3));
        assert_eq!(parse_rating(&text("Regular")), Some(2));
        assert_eq!(parse_rating(&text("Negativa")), Some(2));
        assert_eq!(parse_rating(&text("Muy Negativa")), Some(1));
        assert_eq!(parse_rating(&text("Pésima")), Some(1));
    }

    #[test]
    fn test_parse_rating_rejects_unknown() {
        assert_eq!(parse_rating(&text("xyz")), None);
        assert_eq!(parse_rating(&text("")), None);
        assert_eq!(parse_rating(&CellValue::Empty), None);
    }
}
