//! Core data models for anime-select.
//!
//! Epistemic mapping:
//! - K_i (Knowledge): Concrete types with compile-time guarantees
//! - B_i (Beliefs): Wrapped in Result/Option
//! - I^R (Resolvable): Config parameters
//! - I^B (Bounded): Error variants with fallback results

mod config;
mod error;
mod selection;

pub use config::*;
pub use error::*;
pub use selection::*;
