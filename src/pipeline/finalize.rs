//! Post-scan metrics: turns the accumulated sector state into the report.

use std::collections::HashMap;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::pipeline::types::{
    CommentEntry, CriticalHour, HourBucket, KeywordCount, LocationAggregate, LocationMetrics,
    ManualOverrides, MonthMetrics, MONTH_NAMES, RatingCounts, RetainedComment, SectorAggregate,
    SectorReport, month_index,
};

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Finalizes one sector: merges manual overrides, computes the monthly and
/// annual satisfaction indices, picks the critical hour, ranks locations and
/// builds the keyword and comment tables.
pub fn finalize_sector(
    mut agg: SectorAggregate,
    overrides: &ManualOverrides,
    cfg: &PipelineConfig,
) -> SectorReport {
    apply_overrides(&mut agg.months, overrides);

    let months: Vec<MonthMetrics> = agg
        .months
        .iter()
        .enumerate()
        .map(|(i, bucket)| MonthMetrics {
            month: MONTH_NAMES[i].to_string(),
            satisfaction_index: round1(bucket.satisfaction(cfg.formula)),
            total_responses: bucket.total,
        })
        .collect();

    // Months with no responses are excluded from the average, not averaged
    // in as zero. All-empty years report 0.0.
    let active: Vec<f64> = agg
        .months
        .iter()
        .zip(&months)
        .filter(|(bucket, _)| bucket.total > 0)
        .map(|(_, m)| m.satisfaction_index)
        .collect();
    let annual_satisfaction = if active.is_empty() {
        0.0
    } else {
        round1(active.iter().sum::<f64>() / active.len() as f64)
    };

    let critical_hour = critical_hour(&agg.hours);
    let locations = rank_locations(&agg.locations, cfg);

    SectorReport {
        name: agg.name,
        months,
        annual_satisfaction,
        locations,
        critical_hour,
        positive_comments: comment_entries(&agg.positive_comments, cfg.max_comments),
        negative_comments: comment_entries(&agg.negative_comments, cfg.max_comments),
        positive_keywords: keyword_table(&agg.positive_keywords, cfg.max_keywords),
        negative_keywords: keyword_table(&agg.negative_keywords, cfg.max_keywords),
    }
}

/// Replaces month buckets with manually entered figures when `total > 0`.
/// The positive count is derived from the remainder, floored at zero.
fn apply_overrides(months: &mut [RatingCounts; 12], overrides: &ManualOverrides) {
    for (name, ov) in &overrides.0 {
        if ov.total == 0 {
            continue;
        }
        let Some(idx) = month_index(name) else {
            warn!(month = %name, "manual override for unknown month ignored");
            continue;
        };
        let accounted = ov.muy_positivas + ov.muy_negativas + ov.negativas;
        months[idx] = RatingCounts {
            very_positive: ov.muy_positivas,
            positive: ov.total.saturating_sub(accounted),
            negative: ov.negativas,
            very_negative: ov.muy_negativas,
            total: ov.total,
        };
    }
}

/// Picks the hour with the highest raw negative volume; earlier hours win
/// ties, and an all-quiet day reports hour 0.
///
/// Selection is volume-based on purpose: an hour with 30 complaints out of
/// heavy traffic matters more operationally than one with 2 complaints out
/// of 3 responses.
fn critical_hour(hours: &[HourBucket; 24]) -> CriticalHour {
    let mut best = 0usize;
    for (h, bucket) in hours.iter().enumerate() {
        if bucket.negative > hours[best].negative {
            best = h;
        }
    }
    let bucket = &hours[best];
    let rate = if bucket.total == 0 {
        0.0
    } else {
        bucket.negative as f64 / bucket.total as f64 * 100.0
    };
    CriticalHour {
        hour: format!("{:02}:00", best),
        negative_volume: bucket.negative,
        total: bucket.total,
        negative_rate_percent: round1(rate),
    }
}

fn rank_locations(
    locations: &HashMap<String, LocationAggregate>,
    cfg: &PipelineConfig,
) -> Vec<LocationMetrics> {
    let mut ranked: Vec<LocationMetrics> = locations
        .iter()
        .map(|(name, loc)| LocationMetrics {
            name: name.clone(),
            total_annual: loc.counts.total,
            average_satisfaction: round1(loc.counts.satisfaction(cfg.formula)),
            average_daily: round2(loc.counts.total as f64 / 365.0),
        })
        .collect();
    // Name as secondary key so equal traffic ranks deterministically.
    ranked.sort_by(|a, b| {
        b.total_annual
            .cmp(&a.total_annual)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

fn keyword_table(keywords: &[String], top_n: usize) -> Vec<KeywordCount> {
    let mut freq: HashMap<&str, u32> = HashMap::new();
    for word in keywords {
        *freq.entry(word.as_str()).or_default() += 1;
    }
    let mut table: Vec<KeywordCount> = freq
        .into_iter()
        .map(|(word, count)| KeywordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    table.truncate(top_n);
    table
}

fn comment_entries(comments: &[RetainedComment], max: usize) -> Vec<CommentEntry> {
    comments
        .iter()
        .take(max)
        .map(|c| CommentEntry {
            text: c.text.clone(),
            day: c.day,
            month: c.month as u32 + 1,
            hour: c.hour,
            label: format!("{:02}/{:02} {:02}:00", c.day, c.month + 1, c.hour),
        })
        .collect()
}
