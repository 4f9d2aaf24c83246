//! anime-select - Pick the right anime from search results with Claude.
//!
//! ## Architecture
//!
//! One stateless selection per call, strictly sequential:
//! - **Prompt**: reference metadata + numbered candidates → instruction
//! - **Oracle**: Anthropic Messages API, one attempt, temperature 0
//! - **Validator**: JSON shape/range checks, episode cross-check, confidence downgrade
//!
//! Zero or one candidate never reaches the oracle.
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Compile-time enforced invariants (types, enums)
//! - B_i (Beliefs): The model's reply, validated before it is trusted
//! - I^R (Resolvable): API key, model and endpoint from config/env/CLI
//! - I^B (Bounded): Network/API failures folded into low-confidence results

pub mod client;
pub mod models;
pub mod pipeline;

// Re-exports for convenience
pub use client::{AnthropicClient, Oracle};
pub use models::{
    Candidate, Confidence, Config, EpisodeMatch, ReferenceRecord, SelectionResult, SelectorError,
};
pub use pipeline::{Selector, preflight, select_anime};
