//! Selection prompt.
//!
//! K_i: The numbered list is the index contract. Candidate `i` in the prompt
//! is `candidates[i - 1]`, so input order must be preserved exactly.

use crate::models::{Candidate, ReferenceRecord};
use std::fmt::Display;

/// Render an optional field, substituting `Unknown` when absent.
fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "Unknown".to_string(), |v| v.to_string())
}

/// Build the selection prompt for a reference record and its candidates.
///
/// Callers must not pass an empty candidate list.
pub fn build_prompt(reference: &ReferenceRecord, candidates: &[Candidate]) -> String {
    let candidates_text = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.display_text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an anime title matching expert. Your task is to select the BEST matching anime from a list of search results.

MAL (MyAnimeList) Information:
- Title: "{title}"
- Episodes: {episodes}
- Year: {year}
- Type: {anime_type}

Available Candidates from search:
{candidates_text}

Selection Criteria (in order of importance):
1. **Main series vs Specials/OVA**: Strongly prefer the main TV series over specials, recaps, OVAs or ONAs
2. **Episode count**: The candidate should have a similar number of episodes to the MAL data
3. **Series vs Season**: If the anime has multiple seasons, match the correct season
4. **Title similarity**: Consider romanization variants and alternative titles
5. **Year**: Should be close to the MAL year (within 1-2 years is acceptable)

IMPORTANT NOTES:
- "Specials", "Recap", "OVA", "ONA" usually indicate extra content, NOT the main series
- If episode count differs significantly (>3 episodes), it's likely the wrong match
- Be cautious with very short titles that might match multiple series
- If no good match exists, select the closest one but mark confidence as "low"

Respond with ONLY valid JSON (no markdown, no explanation outside JSON):
{{
  "index": <number from 1 to {count}>,
  "confidence": "high|medium|low",
  "reason": "<brief 1-sentence explanation of why this match was selected>"
}}"#,
        title = reference.title,
        episodes = or_unknown(reference.episodes),
        year = or_unknown(reference.year),
        anime_type = or_unknown(reference.anime_type.as_deref()),
        count = candidates.len(),
    )
}
