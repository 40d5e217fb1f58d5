//! Configuration types for agent runtimes

use serde::{Deserialize, Serialize};

/// Which agent runtime serves turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// In-process runtime driving Google Gemini
    #[default]
    #[serde(alias = "google")]
    Gemini,
    /// ADK-compatible agent server reached over HTTP
    Remote,
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeKind::Gemini => write!(f, "gemini"),
            RuntimeKind::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for RuntimeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(RuntimeKind::Gemini),
            "remote" => Ok(RuntimeKind::Remote),
            other => Err(format!("unknown runtime '{}', expected 'gemini' or 'remote'", other)),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmProviderConfig {
    /// Model name/identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Custom base URL (for proxied endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default temperature for completions
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    /// Default max tokens for completions
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    /// Whether to use streaming
    #[serde(default = "default_true")]
    pub stream: bool,
    /// Ground answers with the Google Search tool
    #[serde(default = "default_true")]
    pub google_search: bool,
    /// Upper bound on time spent retrying transient request failures
    #[serde(default = "default_retry_elapsed")]
    pub max_retry_elapsed_seconds: u64,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream: true,
            google_search: true,
            max_retry_elapsed_seconds: default_retry_elapsed(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_max_tokens() -> Option<u32> {
    Some(8000)
}

fn default_true() -> bool {
    true
}

fn default_retry_elapsed() -> u64 {
    30
}

/// Connection settings for an ADK-compatible agent server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteRuntimeConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// Timeout for one request, including reading a streamed reply
    #[serde(default = "default_remote_timeout")]
    pub timeout_seconds: u64,
    /// Ask the server for token-level partial events
    #[serde(default)]
    pub streaming: bool,
}

fn default_remote_timeout() -> u64 {
    300
}
