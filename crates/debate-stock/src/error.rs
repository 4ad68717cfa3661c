//! Error types for the debate pipeline

use debate_llm::LLMError;
use debate_prompt::PromptError;
use thiserror::Error;

/// Errors raised while producing a verdict
#[derive(Debug, Error)]
pub enum DebateError {
    /// Required configuration (usually the LLM credential) is absent
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Configuration value present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Market data could not be retrieved for the symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// An agent kept hitting rate limits until its attempts ran out
    #[error("Agent '{agent}' failed after {attempts} attempts: {last_error}")]
    AgentExhausted {
        agent: String,
        attempts: u32,
        last_error: String,
    },

    /// An analyst report is missing when the adjudicator needs it
    #[error("Debate incomplete: missing {0} report")]
    IncompleteDebate(String),

    /// The adjudicator returned something that is not a valid verdict
    #[error("CIO agent returned an invalid verdict: {0}")]
    InvalidVerdictFormat(String),

    /// Non-retryable language model failure
    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    /// Prompt rendering failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Generic upstream API error
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DebateError {
    /// Shorthand for [`DebateError::DataUnavailable`]
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for debate operations
pub type Result<T> = std::result::Result<T, DebateError>;
