//! Data model of the aggregation pipeline: mutable per-sector accumulation
//! state and the immutable report produced from it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SatisfactionFormula;
use crate::normalize::normalize;

/// Spanish month names, indexed by calendar month (0-11). The front-end
/// labels its charts with these.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Resolves a month name ("enero", "Febrero", ...) to its 0-based index.
pub fn month_index(name: &str) -> Option<usize> {
    let norm = normalize(name);
    MONTH_NAMES.iter().position(|m| normalize(m) == norm)
}

/// Rating counts for one period (a month) or one whole location.
///
/// As long as counts come purely from sheet rows, `total` equals the sum of
/// the four buckets; a manual override may set `total` independently.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RatingCounts {
    pub very_positive: u32,
    pub positive: u32,
    pub negative: u32,
    pub very_negative: u32,
    pub total: u32,
}

impl RatingCounts {
    /// Classifies a canonical rating into its bucket and bumps the total.
    pub fn record(&mut self, rating: u8) {
        match rating {
            r if r >= 4 => self.very_positive += 1,
            3 => self.positive += 1,
            2 => self.negative += 1,
            _ => self.very_negative += 1,
        }
        self.total += 1;
    }

    /// Satisfaction index in percent, 0.0 when the period has no responses.
    pub fn satisfaction(&self, formula: SatisfactionFormula) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        match formula {
            SatisfactionFormula::Csat => {
                (self.very_positive + self.positive) as f64 / total * 100.0
            }
            SatisfactionFormula::NetBalance => {
                (self.very_positive as f64 - (self.very_negative + self.negative) as f64) / total
                    * 100.0
            }
        }
    }
}

/// Per-hour traffic and negative-response volume.
#[derive(Debug, Default, Clone, Copy)]
pub struct HourBucket {
    pub total: u32,
    pub negative: u32,
}

/// Accumulation state for one location inside a sector.
#[derive(Debug, Default)]
pub struct LocationAggregate {
    pub hours: [HourBucket; 24],
    pub counts: RatingCounts,
}

/// A comment kept for the qualitative section, with when it was left.
#[derive(Debug, Clone)]
pub struct RetainedComment {
    pub text: String,
    pub day: u32,
    /// Calendar month, 0-based.
    pub month: usize,
    pub hour: u32,
}

/// Mutable accumulation state for one sector. Created lazily on the first
/// row naming the sector, mutated once per qualifying row, finalized exactly
/// once into a [`SectorReport`].
#[derive(Debug)]
pub struct SectorAggregate {
    pub name: String,
    pub months: [RatingCounts; 12],
    pub hours: [HourBucket; 24],
    pub locations: HashMap<String, LocationAggregate>,
    pub positive_comments: Vec<RetainedComment>,
    pub negative_comments: Vec<RetainedComment>,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
}

impl SectorAggregate {
    pub fn new(name: &str) -> Self {
        SectorAggregate {
            name: name.to_string(),
            months: Default::default(),
            hours: [HourBucket::default(); 24],
            locations: HashMap::new(),
            positive_comments: Vec::new(),
            negative_comments: Vec::new(),
            positive_keywords: Vec::new(),
            negative_keywords: Vec::new(),
        }
    }
}

/// Manually entered figures for one month, replacing the sheet-derived
/// bucket when `total` is positive. Field names match what the upload form
/// sends.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MonthOverride {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub muy_positivas: u32,
    #[serde(default)]
    pub muy_negativas: u32,
    #[serde(default)]
    pub negativas: u32,
}

/// Manual monthly figures keyed by Spanish month name.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ManualOverrides(pub HashMap<String, MonthOverride>);

// ---------------------------------------------------------------------------
// Finalized report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MonthMetrics {
    pub month: String,
    pub satisfaction_index: f64,
    pub total_responses: u32,
}

#[derive(Debug, Serialize)]
pub struct LocationMetrics {
    pub name: String,
    pub total_annual: u32,
    pub average_satisfaction: f64,
    pub average_daily: f64,
}

#[derive(Debug, Serialize)]
pub struct CriticalHour {
    /// "HH:00" formatted hour with the highest negative volume.
    pub hour: String,
    pub negative_volume: u32,
    pub total: u32,
    pub negative_rate_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct CommentEntry {
    pub text: String,
    pub day: u32,
    /// Calendar month, 1-based in the report.
    pub month: u32,
    pub hour: u32,
    /// "DD/MM HH:00" line shown above the comment.
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: u32,
}

/// Immutable per-sector output, in sector discovery order.
#[derive(Debug, Serialize)]
pub struct SectorReport {
    pub name: String,
    pub months: Vec<MonthMetrics>,
    pub annual_satisfaction: f64,
    pub locations: Vec<LocationMetrics>,
    pub critical_hour: CriticalHour,
    pub positive_comments: Vec<CommentEntry>,
    pub negative_comments: Vec<CommentEntry>,
    pub positive_keywords: Vec<KeywordCount>,
    pub negative_keywords: Vec<KeywordCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_total_consistent() {
        let mut c = RatingCounts::default();
        for r in [4, 4, 3, 2, 1, 1] {
            c.record(r);
        }
        assert_eq!(c.very_positive, 2);
        assert_eq!(c.positive, 1);
        assert_eq!(c.negative, 1);
        assert_eq!(c.very_negative, 2);
        assert_eq!(
            c.total,
            c.very_positive + c.positive + c.negative + c.very_negative
        );
    }

    #[test]
    fn test_satisfaction_formulas() {
        let mut c = RatingCounts::default();
        for r in [4, 3, 2, 1] {
            c.record(r);
        }
        assert_eq!(c.satisfaction(SatisfactionFormula::Csat), 50.0);
        // Net balance counts plain positives in the total only:
        // (1 - (1 + 1)) / 4 * 100.
        assert_eq!(c.satisfaction(SatisfactionFormula::NetBalance), -25.0);
    }

    #[test]
    fn test_net_balance_can_break_even() {
        let mut c = RatingCounts::default();
        for r in [4, 4, 2, 1] {
            c.record(r);
        }
        assert_eq!(c.satisfaction(SatisfactionFormula::NetBalance), 0.0);
    }

    #[test]
    fn test_satisfaction_of_empty_period_is_zero() {
        let c = RatingCounts::default();
        assert_eq!(c.satisfaction(SatisfactionFormula::Csat), 0.0);
    }

    #[test]
    fn test_month_index_is_accent_and_case_insensitive() {
        assert_eq!(month_index("enero"), Some(0));
        assert_eq!(month_index("FEBRERO"), Some(1));
        assert_eq!(month_index("diciembre"), Some(11));
        assert_eq!(month_index("brumario"), None);
    }
}
