//! Response validation and confidence adjustment.
//!
//! Epistemic foundation:
//! - B_i: The model answered with the requested JSON object (might not)
//! - B_i: Its index points into the candidate list (might not)
//! - K_i: The episode count in the chosen label is checked deterministically
//!
//! Every failure here degrades to the first candidate with low confidence;
//! nothing propagates as an error.

use crate::models::{
    Candidate, Confidence, EpisodeCheck, EpisodeMatch, ReferenceRecord, SelectionResult,
};
use crate::pipeline::episodes::{classify_episode_match, parse_episode_count};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Remove a markdown code fence and a leading `json` language tag.
pub fn strip_markdown_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.starts_with("```") {
        // Drop the opening and closing fence lines
        text = match (text.find('\n'), text.rfind('\n')) {
            (Some(first), Some(last)) if first < last => &text[first + 1..last],
            _ => "",
        };
    }

    if let Some(rest) = text.strip_prefix("json") {
        text = rest;
    }

    text.trim()
}

/// Shape- and range-checked reply from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelReply {
    index: u32,
    confidence: Confidence,
    reason: Option<String>,
}

/// Check the decoded object against the candidate count.
///
/// `None` means the required keys are missing; a bad index is repaired here.
fn check_reply(object: &Map<String, Value>, candidate_count: usize) -> Option<ModelReply> {
    let raw_index = object.get("index")?;
    let raw_confidence = object.get("confidence")?;

    let confidence = raw_confidence
        .as_str()
        .and_then(Confidence::from_label)
        .unwrap_or_else(|| {
            warn!(confidence = %raw_confidence, "Unrecognized confidence label, reading as low");
            Confidence::Low
        });
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    let index = raw_index
        .as_u64()
        .filter(|&i| i >= 1 && i <= candidate_count as u64)
        .and_then(|i| u32::try_from(i).ok());

    Some(match index {
        Some(index) => ModelReply {
            index,
            confidence,
            reason,
        },
        None => {
            // Strings are shown bare, everything else as JSON text
            let shown = raw_index
                .as_str()
                .map_or_else(|| raw_index.to_string(), str::to_string);
            warn!(index = %shown, candidate_count, "Index out of range, using first candidate");
            ModelReply {
                index: 1,
                confidence: Confidence::Low,
                reason: Some(format!("Invalid index {shown}, using first candidate")),
            }
        }
    })
}

/// Validate the model's raw reply and adjust its confidence.
///
/// `candidates` must be non-empty.
pub fn validate(
    raw_text: &str,
    reference: &ReferenceRecord,
    candidates: &[Candidate],
) -> SelectionResult {
    let text = strip_markdown_fence(raw_text);

    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Model reply is not valid JSON");
            return SelectionResult::fallback(
                format!("Failed to parse model response: {e}"),
                "JSON parsing error",
            );
        }
    };

    let Some(reply) = value
        .as_object()
        .and_then(|object| check_reply(object, candidates.len()))
    else {
        warn!(reply = %value, "Model reply is missing index or confidence");
        return SelectionResult::fallback(
            "Invalid response format from model",
            "API response was malformed",
        );
    };

    let selected_episodes = candidates
        .get(reply.index as usize - 1)
        .and_then(|chosen| parse_episode_count(&chosen.display_text));
    let episode_match = classify_episode_match(reference.episodes, selected_episodes);

    let confidence = if episode_match == EpisodeMatch::Mismatch {
        let lowered = reply.confidence.downgrade();
        debug!(
            from = %reply.confidence,
            to = %lowered,
            mal_episodes = ?reference.episodes,
            selected_episodes = ?selected_episodes,
            "Episode mismatch, lowering confidence"
        );
        lowered
    } else {
        reply.confidence
    };

    SelectionResult {
        index: reply.index,
        confidence,
        reason: reply.reason,
        error: None,
        episodes: Some(EpisodeCheck {
            mal_episodes: reference.episodes,
            selected_episodes,
            episode_match,
        }),
    }
}
