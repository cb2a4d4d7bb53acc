//! Planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::query::Locale;
use crate::search::SearchDepth;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); `--log-level` wins
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Reasoning provider configuration
    pub llm: LlmConfig,

    /// Search provider configuration
    pub search: SearchConfig,

    /// Planning behaviour
    pub planner: PlannerConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .freeplan.yml
        let local_config = PathBuf::from(".freeplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/freeplan/freeplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("freeplan").join("freeplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Read an API key from the named environment variable, ignoring blank values
fn read_api_key(env: &str) -> Option<String> {
    debug!(%env, "read_api_key: called");
    std::env::var(env).ok().filter(|key| !key.trim().is_empty())
}

/// Reasoning provider (OpenAI Chat Completions) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; provider default when unset
    pub temperature: Option<f32>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Transport-level retries for transient statuses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            temperature: None,
            timeout_ms: 30_000,
            max_retries: 0,
        }
    }
}

/// Search provider (Tavily) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Depth for route lookups in the decision stage
    #[serde(rename = "route-depth")]
    pub route_depth: SearchDepth,

    #[serde(rename = "route-max-results")]
    pub route_max_results: u32,

    /// Depth for activity lookups in the plan stage
    #[serde(rename = "plan-depth")]
    pub plan_depth: SearchDepth,

    #[serde(rename = "plan-max-results")]
    pub plan_max_results: u32,
}

impl SearchConfig {
    pub fn api_key(&self) -> Option<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "TAVILY_API_KEY".to_string(),
            base_url: "https://api.tavily.com".to_string(),
            timeout_ms: 30_000,
            route_depth: SearchDepth::Basic,
            route_max_results: 5,
            plan_depth: SearchDepth::Advanced,
            plan_max_results: 7,
        }
    }
}

/// Planning behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Phrasing for search queries and the language of generated text
    pub locale: Locale,

    /// Reject generated plans whose events do not tile the window
    #[serde(rename = "enforce-tiling")]
    pub enforce_tiling: bool,

    /// Directory with `.pmt` template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Token cap for the decision completion
    #[serde(rename = "decision-max-tokens")]
    pub decision_max_tokens: u32,

    /// Token cap for the plan completion
    #[serde(rename = "plan-max-tokens")]
    pub plan_max_tokens: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            enforce_tiling: false,
            prompts_dir: None,
            decision_max_tokens: 1024,
            plan_max_tokens: 4096,
        }
    }
}
