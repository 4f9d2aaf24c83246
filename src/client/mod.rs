//! Completion oracle module.

mod anthropic;

pub use anthropic::*;

use crate::models::OracleError;
use std::future::Future;

/// A text-completion service used as the ranking oracle.
///
/// K_i: One prompt in, raw completion text out. Retrying is the caller's
/// business, and this crate never does it.
pub trait Oracle {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, OracleError>> + Send;
}
