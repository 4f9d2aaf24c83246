//! Configuration models for anime-select.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! Every field has a default, so running without a config file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for anime-select.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Anthropic API configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Anthropic API configuration.
///
/// K_i: Token ceiling and temperature are fixed by the selector and are not
/// configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (can also be set via ANTHROPIC_API_KEY env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL for the Anthropic API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for selection
    #[serde(default = "default_model")]
    pub model: String,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout() -> u64 {
    600
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            anthropic_version: default_anthropic_version(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Resolve the API key.
    ///
    /// Precedence: explicit argument, then `api_key` in config, then the
    /// environment variable. Empty values, and config keys still holding an
    /// unresolved `${VAR}` placeholder, count as absent.
    ///
    /// B_i(api key available) → Result
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }

        if let Some(key) = &self.anthropic.api_key {
            let key = expand_env_vars(key);
            if !key.trim().is_empty() && !has_placeholder(&key) {
                return Ok(key);
            }
        }

        std::env::var(&self.anthropic.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: self.anthropic.api_key_env.clone(),
            })
    }
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let Ok(re) = regex::Regex::new(r"\$\{([^}]+)\}") else {
        return s.to_string();
    };

    let mut result = s.to_string();
    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Whether `${VAR}` placeholders survived expansion.
fn has_placeholder(s: &str) -> bool {
    regex::Regex::new(r"\$\{[^}]+\}").is_ok_and(|re| re.is_match(s))
}

/// Example configuration printed by `--example-config`.
pub const EXAMPLE_CONFIG: &str = r#"# anime-select configuration file

[anthropic]
# API key (can also use ANTHROPIC_API_KEY env var, or --api-key)
# api_key = "${MY_ANTHROPIC_KEY}"
api_key_env = "ANTHROPIC_API_KEY"
base_url = "https://api.anthropic.com/v1"
model = "claude-3-5-haiku-20241022"
anthropic_version = "2023-06-01"
timeout_secs = 600
"#;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{env_var} not set in environment")]
    MissingApiKey { env_var: String },
}
