//! Selection pipeline.
//!
//! Pipeline flow:
//! Candidates → shortcut? → Prompt → Oracle → Validator → SelectionResult

use crate::client::{AnthropicClient, Oracle};
use crate::models::{
    Candidate, Confidence, Config, ConfigError, ReferenceRecord, SelectionResult, SelectorError,
    parse_candidates,
};
use crate::pipeline::prompt::build_prompt;
use crate::pipeline::validator::validate;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Results that need no oracle call: zero or one candidate.
pub fn shortcut(candidates: &[Candidate]) -> Option<SelectionResult> {
    match candidates.len() {
        0 => Some(SelectorError::NoCandidates.into_result()),
        1 => Some(SelectionResult {
            index: 1,
            confidence: Confidence::High,
            reason: Some("Only one candidate available".to_string()),
            error: None,
            episodes: None,
        }),
        _ => None,
    }
}

/// Parse the candidates argument, then load the configuration.
///
/// Candidates are checked first, so a malformed list is reported even when
/// the config file is also broken. No config path means defaults.
pub fn preflight(
    candidates_json: &str,
    config_path: Option<&Path>,
) -> Result<(Vec<Candidate>, Config), SelectorError> {
    let candidates = parse_candidates(candidates_json)?;
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    Ok((candidates, config))
}

/// Picks the best candidate using an oracle.
pub struct Selector<O> {
    oracle: O,
}

impl<O: Oracle> Selector<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    #[cfg(test)]
    fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Run one selection.
    ///
    /// Never fails: every error is folded into the returned result.
    pub async fn select(
        &self,
        reference: &ReferenceRecord,
        candidates: &[Candidate],
    ) -> SelectionResult {
        if let Some(result) = shortcut(candidates) {
            debug!(candidates = candidates.len(), "Shortcut, oracle not consulted");
            return result;
        }

        let start = Instant::now();
        let prompt = build_prompt(reference, candidates);
        debug!(
            title = %reference.title,
            candidates = candidates.len(),
            prompt_chars = prompt.len(),
            "Prompt built"
        );

        let raw = match self.oracle.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(title = %reference.title, error = %e, "Oracle call failed");
                return SelectorError::Oracle(e).into_result();
            }
        };
        debug!(reply = %raw, "Oracle replied");

        let result = validate(&raw, reference, candidates);

        info!(
            title = %reference.title,
            index = result.index,
            confidence = %result.confidence,
            episode_match = ?result.episodes.as_ref().map(|e| e.episode_match),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Selection complete"
        );

        result
    }
}

/// Select with the Anthropic API, resolving the credential at this boundary.
///
/// Order: candidate shortcuts, then credential, then the oracle call.
/// `api_key` overrides the configured key and the environment.
pub async fn select_anime(
    reference: &ReferenceRecord,
    candidates: &[Candidate],
    api_key: Option<&str>,
    config: &Config,
) -> SelectionResult {
    if let Some(result) = shortcut(candidates) {
        return result;
    }

    let api_key = match config.resolve_api_key(api_key) {
        Ok(key) => key,
        Err(ConfigError::MissingApiKey { env_var }) => {
            return SelectorError::MissingCredential { env_var }.into_result();
        }
        Err(e) => return SelectorError::Config(e).into_result(),
    };

    let client = match AnthropicClient::new(api_key, &config.anthropic) {
        Ok(client) => client,
        Err(e) => return SelectorError::Oracle(e).into_result(),
    };

    Selector::new(client).select(reference, candidates).await
}
