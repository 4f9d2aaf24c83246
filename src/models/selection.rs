//! Reference, candidate and result types for anime-select.
//!
//! K_i: These types represent the data flowing through one selection.

use super::SelectorError;
use serde::{Deserialize, Serialize};

/// Metadata the selection must match against (usually a MyAnimeList entry).
///
/// K_i: Only the title is guaranteed; everything else may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Canonical title
    pub title: String,

    /// Total episode count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,

    /// Airing year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    /// Media type ("TV", "Movie", "OVA", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anime_type: Option<String>,
}

impl ReferenceRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = Some(episodes);
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_anime_type(mut self, anime_type: impl Into<String>) -> Self {
        self.anime_type = Some(anime_type.into());
        self
    }
}

/// One entry of the search results, in the order the search returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate {
    /// Free-form label, e.g. `"Naruto (220 eps)"`
    pub display_text: String,
}

impl Candidate {
    pub fn new(display_text: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
        }
    }
}

/// Parse the `--candidates` argument: a JSON array of strings.
///
/// B_i(argument is a JSON array of strings) → Result
pub fn parse_candidates(json: &str) -> Result<Vec<Candidate>, SelectorError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|_| {
        SelectorError::InvalidInput("Invalid JSON in candidates argument".to_string())
    })?;

    let not_a_list =
        || SelectorError::InvalidInput("Candidates must be a JSON array of strings".to_string());

    value
        .as_array()
        .ok_or_else(not_a_list)?
        .iter()
        .map(|v| v.as_str().map(Candidate::new).ok_or_else(not_a_list))
        .collect()
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Candidate {
    fn from(display_text: String) -> Self {
        Self { display_text }
    }
}

/// Trust in a selection.
///
/// K_i: `High > Medium > Low` is a total order; `Error` sits outside it and
/// only ever appears on results that carry an `error` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Error,
}

impl Confidence {
    /// Parse a label reported by the model. Unknown labels are not accepted.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Move one step down the `high > medium > low` order.
    ///
    /// `Low` is a fixed point; `Error` is never adjusted.
    pub fn downgrade(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::Low,
            Self::Error => Self::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How closely the chosen candidate's episode count agrees with the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeMatch {
    /// Identical counts
    Exact,
    /// Off by at most 2
    Close,
    /// Off by at most 5, or by at most 10% of the reference
    Acceptable,
    /// Anything further apart
    Mismatch,
    /// One side has no count
    Unknown,
}

/// Episode cross-check attached to results that went through the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCheck {
    /// Episode count of the reference record
    pub mal_episodes: Option<u32>,

    /// Episode count parsed from the chosen candidate
    pub selected_episodes: Option<u32>,

    /// Classification of the two counts
    pub episode_match: EpisodeMatch,
}

/// Outcome of one selection, printed as a single JSON object.
///
/// K_i: `error` present ⇒ `index ∈ {0, 1}` and `confidence ∈ {error, low}`.
/// The presence of `error` is the only failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// 1-based candidate index, 0 when nothing could be selected
    pub index: u32,

    pub confidence: Confidence,

    /// Human-readable rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Set iff the pipeline terminated abnormally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Episode cross-check (validated oracle path only)
    #[serde(flatten)]
    pub episodes: Option<EpisodeCheck>,
}

impl SelectionResult {
    /// A fatal failure before any candidate could be chosen.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            index: 0,
            confidence: Confidence::Error,
            reason: None,
            error: Some(error.into()),
            episodes: None,
        }
    }

    /// A degraded outcome that still points at the first candidate.
    pub fn fallback(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            index: 1,
            confidence: Confidence::Low,
            reason: Some(reason.into()),
            error: Some(error.into()),
            episodes: None,
        }
    }

    /// Whether the pipeline terminated abnormally.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Process exit status: non-zero iff `error` is present.
    pub fn exit_code(&self) -> u8 {
        if self.is_error() { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_downgrade_is_monotonic() {
        assert_eq!(Confidence::High.downgrade(), Confidence::Medium);
        assert_eq!(Confidence::Medium.downgrade(), Confidence::Low);
        assert_eq!(Confidence::Low.downgrade(), Confidence::Low);
        assert_eq!(Confidence::Low.downgrade().downgrade(), Confidence::Low);
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(Confidence::from_label("high"), Some(Confidence::High));
        assert_eq!(Confidence::from_label(" Medium "), Some(Confidence::Medium));
        assert_eq!(Confidence::from_label("LOW"), Some(Confidence::Low));
        assert_eq!(Confidence::from_label("error"), None);
        assert_eq!(Confidence::from_label("certain"), None);
    }

    #[test]
    fn test_failed_result_serialization() {
        let result = SelectionResult::failed("No candidates provided");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"index": 0, "confidence": "error", "error": "No candidates provided"})
        );
    }

    #[test]
    fn test_episode_block_emits_null_counts() {
        let result = SelectionResult {
            index: 2,
            confidence: Confidence::Medium,
            reason: Some("closest season".to_string()),
            error: None,
            episodes: Some(EpisodeCheck {
                mal_episodes: Some(12),
                selected_episodes: None,
                episode_match: EpisodeMatch::Unknown,
            }),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "index": 2,
                "confidence": "medium",
                "reason": "closest season",
                "mal_episodes": 12,
                "selected_episodes": null,
                "episode_match": "unknown"
            })
        );
    }

    #[test]
    fn test_exit_code_tracks_error_field() {
        let ok = SelectionResult {
            index: 1,
            confidence: Confidence::High,
            reason: Some("Only one candidate available".to_string()),
            error: None,
            episodes: None,
        };
        assert_eq!(ok.exit_code(), 0);
        assert_eq!(SelectionResult::failed("boom").exit_code(), 1);
        assert_eq!(SelectionResult::fallback("boom", "JSON parsing error").exit_code(), 1);
    }

    #[test]
    fn test_parse_candidates() {
        let list = parse_candidates(r#"["Naruto (220 eps)", "Naruto: Specials (5 eps)"]"#).unwrap();
        assert_eq!(
            list,
            vec![
                Candidate::from("Naruto (220 eps)"),
                Candidate::from("Naruto: Specials (5 eps)"),
            ]
        );
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_candidates_rejects_malformed() {
        let err = parse_candidates("[\"unterminated").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON in candidates argument");

        for bad in [r#"{"a": 1}"#, r#""Naruto""#, r#"["ok", 3]"#, "null"] {
            let result = parse_candidates(bad).unwrap_err().into_result();
            assert_eq!(result.index, 0, "{bad}");
            assert_eq!(result.confidence, Confidence::Error, "{bad}");
            assert_eq!(
                result.error.as_deref(),
                Some("Candidates must be a JSON array of strings")
            );
        }
    }

    #[test]
    fn test_candidates_deserialize_from_plain_strings() {
        let candidates: Vec<Candidate> =
            serde_json::from_str(r#"["Naruto (220 eps)", "Naruto: Specials (5 eps)"]"#).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].display_text, "Naruto: Specials (5 eps)");
    }
}
