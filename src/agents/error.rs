//! Error types for the agent layer

use thiserror::Error;

/// Errors that can occur while running a conversational turn
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent runtime rejected or failed the turn
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Session store error
    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout
    #[error("Operation timed out after {0}s")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors specific to LLM provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    Streaming(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Content filtered
    #[error("Content filtered by safety system")]
    ContentFiltered,

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited(_) | LlmError::Network(_) | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors reported by a session store backend
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The store refuses to hold more sessions
    #[error("Session capacity of {0} reached")]
    CapacityExceeded(usize),

    /// The backing service answered with an error
    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    /// The backing service could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The configured endpoint is not usable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for SessionStoreError {
    fn from(err: reqwest::Error) -> Self {
        SessionStoreError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for session store operations
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;
