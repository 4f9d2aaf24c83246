//! Error types for anime-select.
//!
//! Epistemic taxonomy:
//! - B_i falsified before the oracle: bad input, missing credential (fatal, index 0)
//! - I^B materialized at the oracle: transport, auth, quota (degraded, index 1)
//! - B_i falsified after the oracle: response not in the expected shape (degraded, index 1)

use super::{Confidence, SelectionResult};
use thiserror::Error;

/// Top-level error type for anime-select.
#[derive(Debug, Error)]
pub enum SelectorError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED — caught before the oracle is consulted
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("No candidates provided")]
    NoCandidates,

    #[error("{env_var} not set in environment")]
    MissingCredential { env_var: String },

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED — the completion service failed us
    // ═══════════════════════════════════════════════════════════════════
    #[error("API call failed: {0}")]
    Oracle(#[from] OracleError),
}

/// Anthropic API specific errors.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Rate limited by Anthropic: {0}")]
    RateLimited(String),

    #[error("Anthropic API overloaded: {0}")]
    Overloaded(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl OracleError {
    /// Stable name of the failure category, surfaced in `reason`.
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "AuthenticationError",
            Self::PermissionDenied(_) => "PermissionDeniedError",
            Self::ModelNotFound(_) => "NotFoundError",
            Self::RateLimited(_) => "RateLimitError",
            Self::Overloaded(_) => "OverloadedError",
            Self::ApiError { .. } => "APIStatusError",
            Self::Network(_) => "APIConnectionError",
            Self::Timeout(_) => "APITimeoutError",
            Self::InvalidResponse(_) => "InvalidResponseError",
            Self::ClientBuild(_) => "ClientBuildError",
        }
    }
}

impl SelectorError {
    /// Convert the error into the result record emitted on stdout.
    ///
    /// K_i: pre-oracle failures have no sensible fallback (index 0);
    /// oracle failures still leave the first candidate usable (index 1).
    pub fn into_result(self) -> SelectionResult {
        match self {
            Self::Oracle(e) => SelectionResult {
                index: 1,
                confidence: Confidence::Low,
                reason: Some(format!("Oracle failure: {}", e.category())),
                error: Some(format!("API call failed: {e}")),
                episodes: None,
            },
            other => SelectionResult::failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message() {
        let err = SelectorError::MissingCredential {
            env_var: "ANTHROPIC_API_KEY".to_string(),
        };
        let result = err.into_result();
        assert_eq!(
            result.error.as_deref(),
            Some("ANTHROPIC_API_KEY not set in environment")
        );
        assert_eq!(result.index, 0);
        assert_eq!(result.confidence, Confidence::Error);
    }

    #[test]
    fn test_oracle_failure_degrades_to_first_candidate() {
        let err = SelectorError::from(OracleError::RateLimited("slow down".to_string()));
        let result = err.into_result();
        assert_eq!(result.index, 1);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.reason.as_deref(), Some("Oracle failure: RateLimitError"));
        let message = result.error.unwrap();
        assert!(message.starts_with("API call failed: "));
        assert!(message.contains("slow down"));
    }

    #[test]
    fn test_no_candidates_is_fatal() {
        let result = SelectorError::NoCandidates.into_result();
        assert_eq!(result.error.as_deref(), Some("No candidates provided"));
        assert_eq!(result.index, 0);
        assert!(result.reason.is_none());
    }
}
