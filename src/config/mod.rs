//! Configuration management.
//!
//! Configuration is read from an optional TOML file and overlaid with
//! environment variables prefixed `QUESTION_EXPLORER`, using `__` between
//! nested keys:
//!
//! ```toml
//! [api_keys]
//! perplexity = "pplx-..."
//! openai = "sk-..."
//!
//! [research]
//! base_url = "https://api.perplexity.ai"
//! model = "llama-3.1-sonar-large-128k-online"
//! temperature = 0.7
//! search_recency_filter = "month"
//!
//! [generation]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! temperature = 0.7
//! max_tokens = 5000
//!
//! [exploration]
//! depth = 2
//! requests_per_minute = 45
//! throttle = "sleep"
//!
//! [transcript]
//! path = "perplexity_related_questions.txt"
//!
//! [http]
//! timeout_secs = 120
//! connect_timeout_secs = 10
//! ```
//!
//! API keys default to `PERPLEXITY_API_KEY` and `OPENAI_API_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "QUESTION_EXPLORER";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "question-explorer.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for the external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Research provider settings
    #[serde(default)]
    pub research: ResearchConfig,

    /// Follow-up question generator settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Tree expansion settings
    #[serde(default)]
    pub exploration: ExplorationConfig,

    /// Transcript file settings
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Perplexity API key
    #[serde(default = "env_perplexity_key")]
    pub perplexity: Option<String>,

    /// OpenAI API key
    #[serde(default = "env_openai_key")]
    pub openai: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            perplexity: env_perplexity_key(),
            openai: env_openai_key(),
        }
    }
}

fn env_perplexity_key() -> Option<String> {
    std::env::var("PERPLEXITY_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

fn env_openai_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Research provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_research_base_url")]
    pub base_url: String,

    #[serde(default = "default_research_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// How far back the provider's web search may look
    #[serde(default = "default_recency_filter")]
    pub search_recency_filter: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_research_base_url(),
            model: default_research_model(),
            temperature: default_temperature(),
            search_recency_filter: default_recency_filter(),
        }
    }
}

fn default_research_base_url() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_research_model() -> String {
    "llama-3.1-sonar-large-128k-online".to_string()
}

fn default_recency_filter() -> String {
    "month".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

/// Question generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    5000
}

/// How the fan-out of each node is paced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleStrategy {
    /// Sleep a fixed `60 / requests_per_minute` seconds per candidate
    #[default]
    Sleep,
    /// Acquire a permit from a token bucket per candidate
    TokenBucket,
}

/// Exploration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Maximum depth of the question tree (root is depth 0)
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Rate limit applied per follow-up candidate
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default)]
    pub throttle: ThrottleStrategy,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            requests_per_minute: default_requests_per_minute(),
            throttle: ThrottleStrategy::default(),
        }
    }
}

fn default_depth() -> usize {
    2
}

fn default_requests_per_minute() -> u32 {
    45
}

/// Transcript configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Append-only transcript file
    #[serde(default = "default_transcript_path")]
    pub path: PathBuf,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            path: default_transcript_path(),
        }
    }
}

fn default_transcript_path() -> PathBuf {
    PathBuf::from("perplexity_related_questions.txt")
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    10
}

/// Invalid configuration values
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be between 0.0 and 2.0, got: {value}")]
    Temperature { field: &'static str, value: f32 },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

impl Config {
    /// Check that every value is within its accepted range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        check_temperature("research.temperature", self.research.temperature)?;
        check_temperature("generation.temperature", self.generation.temperature)?;

        if self.research.model.trim().is_empty() {
            return Err(ConfigValidationError::Empty("research.model"));
        }
        if self.research.base_url.trim().is_empty() {
            return Err(ConfigValidationError::Empty("research.base_url"));
        }
        if self.generation.model.trim().is_empty() {
            return Err(ConfigValidationError::Empty("generation.model"));
        }
        if self.generation.base_url.trim().is_empty() {
            return Err(ConfigValidationError::Empty("generation.base_url"));
        }
        if self.generation.max_tokens == 0 {
            return Err(ConfigValidationError::Zero("generation.max_tokens"));
        }
        if self.exploration.requests_per_minute == 0 {
            return Err(ConfigValidationError::Zero("exploration.requests_per_minute"));
        }
        if self.transcript.path.as_os_str().is_empty() {
            return Err(ConfigValidationError::Empty("transcript.path"));
        }

        Ok(())
    }
}

fn check_temperature(field: &'static str, value: f32) -> Result<(), ConfigValidationError> {
    if (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigValidationError::Temperature { field, value })
    }
}

/// Load configuration from a file, overlaid with environment variables
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables only
pub fn load_env_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    locate_config_file(Path::new("."), default_config_dir())
}

fn locate_config_file(work_dir: &Path, user_dir: Option<PathBuf>) -> Option<PathBuf> {
    let local = work_dir.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    let user = user_dir?.join("config.toml");
    user.is_file().then_some(user)
}

/// Per-user configuration directory
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("question-explorer"))
}
