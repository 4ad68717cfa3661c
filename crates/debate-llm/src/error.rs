//! Error types for LLM operations

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Message fragments providers use when they throttle a caller without a 429.
static RATE_LIMIT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b429\b|quota|rate[ _-]?limit|resource[ _-]?exhausted|too many requests").ok()
});

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(any(feature = "gemini", feature = "openai"))]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether this failure is throttling and worth retrying after a pause.
    ///
    /// Providers do not all surface throttling as a 429, so the rendered
    /// message is also checked for quota and rate-limit wording.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) => true,
            Self::AuthenticationFailed
            | Self::InvalidRequest(_)
            | Self::ModelNotFound(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_) => false,
            other => RATE_LIMIT_PATTERN
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(&other.to_string())),
        }
    }
}
