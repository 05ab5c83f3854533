//! Sector-aware comment relevance filter.
//!
//! Keyword clouds degrade fast when off-topic comments leak in: visitors
//! routinely type gaming-floor complaints into whatever kiosk is nearby, so
//! a restroom-sector cloud ends up full of slot-machine vocabulary. The
//! filter is deliberately heuristic; false accepts and rejects are expected.
//! Two properties must hold: noise suppression applies only to sectors that
//! map to a known category, and the general fallback filters on length only.

use crate::config::{PipelineConfig, SectorVocab};
use crate::normalize::normalize;

/// Maps a sector name to its category vocabulary, `None` for general.
pub fn categorize<'a>(sector_name: &str, cfg: &'a PipelineConfig) -> Option<&'a SectorVocab> {
    let norm = normalize(sector_name);
    if norm.is_empty() {
        return None;
    }
    cfg.categories
        .iter()
        .find(|c| c.markers.iter().any(|m| norm.contains(m.as_str())))
}

/// Decides whether a comment belongs in the sector's qualitative section.
///
/// Too-short comments are always rejected. For a categorized sector, any
/// noise term rejects before the contextual vocabulary is consulted; the
/// general fallback accepts everything past the length gate.
pub fn is_relevant(comment: &str, sector_name: &str, cfg: &PipelineConfig) -> bool {
    let norm = normalize(comment);
    if norm.chars().count() < cfg.min_comment_len {
        return false;
    }

    let Some(category) = categorize(sector_name, cfg) else {
        return true;
    };

    if cfg.noise_terms.iter().any(|t| norm.contains(t.as_str())) {
        return false;
    }

    category.context.iter().any(|t| norm.contains(t.as_str()))
}
