//! Selection pipeline module.

pub mod episodes;
pub mod prompt;
mod selector;
pub mod validator;

pub use episodes::{classify_episode_match, parse_episode_count};
pub use prompt::build_prompt;
pub use selector::*;
pub use validator::{strip_markdown_fence, validate};
