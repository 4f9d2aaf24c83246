//! Episode-count extraction and comparison.
//!
//! K_i: Search results label their length as "64 eps", "(12 ep)", "24EPS".
//! Anything else yields no count, never an error.

use crate::models::EpisodeMatch;
use regex::Regex;
use std::sync::LazyLock;

static EPISODE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\(?\s*\b(\d+)\s*eps?\b\s*\)?").ok());

/// Parse the episode count embedded in a candidate label.
pub fn parse_episode_count(text: &str) -> Option<u32> {
    EPISODE_RE
        .as_ref()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
}

/// Classify how far apart two episode counts are.
///
/// Thresholds: 0 → exact, ≤2 → close, ≤5 or ≤10% of the reference →
/// acceptable, otherwise mismatch.
pub fn classify_episode_match(reference: Option<u32>, matched: Option<u32>) -> EpisodeMatch {
    let (Some(reference), Some(matched)) = (reference, matched) else {
        return EpisodeMatch::Unknown;
    };

    let diff = reference.abs_diff(matched);
    match diff {
        0 => EpisodeMatch::Exact,
        1..=2 => EpisodeMatch::Close,
        3..=5 => EpisodeMatch::Acceptable,
        // diff / reference <= 10%, kept in integers
        _ if u64::from(diff) * 10 <= u64::from(reference) => EpisodeMatch::Acceptable,
        _ => EpisodeMatch::Mismatch,
    }
}
