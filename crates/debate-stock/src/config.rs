//! Configuration for the debate pipeline

use crate::error::{DebateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longest price-history window accepted, in days
pub const MAX_HISTORY_DAYS: i64 = 36_500;

/// Text-generation backend used by every agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini (default)
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
}

impl LlmBackend {
    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-pro",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variable holding this backend's credential
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for LlmBackend {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "open_ai" | "openai-compatible" => Ok(Self::OpenAi),
            other => Err(DebateError::InvalidConfig(format!(
                "unknown LLM backend '{other}'"
            ))),
        }
    }
}

/// Macro and sector figures the pipeline does not fetch
///
/// These are fixed assumptions fed to the agents. Replace them here once a
/// real source exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAssumptions {
    /// Sector trailing P/E median used for valuation comparisons
    pub sector_pe_median: f64,
    /// US GDP growth expectation in percent
    pub gdp_expectation_pct: f64,
    /// Federal funds rate direction label
    pub fed_funds_trend: String,
}

impl Default for MacroAssumptions {
    fn default() -> Self {
        Self {
            sector_pe_median: 25.0,
            gdp_expectation_pct: 2.0,
            fed_funds_trend: "Stable".to_string(),
        }
    }
}

/// Configuration for a debate run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Text-generation backend
    pub backend: LlmBackend,

    /// Model identifier passed to the backend
    pub model: String,

    /// Backend credential
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Override for the backend base URL
    pub api_base: Option<String>,

    /// Sampling temperature for every agent
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    pub max_output_tokens: usize,

    /// HTTP request timeout for LLM calls
    pub request_timeout: Duration,

    /// Attempts per agent before giving up on rate limits
    pub retry_max_attempts: u32,

    /// Base delay for exponential backoff
    pub retry_backoff_base: Duration,

    /// How long a finished analysis stays valid
    pub cache_ttl: Duration,

    /// Directory for the on-disk result cache; in-memory when unset
    pub cache_dir: Option<PathBuf>,

    /// Days of daily history fetched for indicators
    pub history_days: i64,

    /// Daily bars included in the result chart
    pub chart_bars: usize,

    /// Headlines passed to the sentiment view
    pub headline_limit: usize,

    /// VIX level used when the live value is unavailable
    pub vix_fallback: f64,

    /// PEG ratio used when it can be neither read nor derived
    pub peg_fallback: f64,

    /// Fixed macro inputs
    pub macro_assumptions: MacroAssumptions,
}

impl Default for DebateConfig {
    fn default() -> Self {
        let backend = LlmBackend::default();
        Self {
            backend,
            model: backend.default_model().to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.0,
            max_output_tokens: 8192,
            request_timeout: Duration::from_secs(120),
            retry_max_attempts: 3,
            retry_backoff_base: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(4 * 3600),
            cache_dir: None,
            history_days: 365,
            chart_bars: 30,
            headline_limit: 5,
            vix_fallback: 15.0,
            peg_fallback: 2.0,
            macro_assumptions: MacroAssumptions::default(),
        }
    }
}

impl DebateConfig {
    /// Create a new configuration builder
    pub fn builder() -> DebateConfigBuilder {
        DebateConfigBuilder::default()
    }

    /// Build a configuration from process environment variables
    ///
    /// Reads `LLM_BACKEND`, `GEMINI_API_KEY` / `OPENAI_API_KEY`,
    /// `OPENAI_API_BASE`, `LLM_MODEL` and `DEBATE_CACHE_DIR`. A missing key is
    /// not an error here; [`DebateConfig::validate`] reports it.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        let backend = match std::env::var("LLM_BACKEND") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => LlmBackend::default(),
        };
        builder = builder.backend(backend);

        if let Some(key) = non_empty_var(backend.api_key_var()) {
            builder = builder.api_key(key);
        }
        if backend == LlmBackend::OpenAi {
            if let Some(base) = non_empty_var("OPENAI_API_BASE") {
                builder = builder.api_base(base);
            }
        }
        if let Some(model) = non_empty_var("LLM_MODEL") {
            builder = builder.model(model);
        }
        if let Some(dir) = non_empty_var("DEBATE_CACHE_DIR") {
            builder = builder.cache_dir(dir);
        }

        Ok(builder.build_unchecked())
    }

    /// Validate the configuration
    ///
    /// A missing credential is reported as [`DebateError::ConfigurationMissing`].
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(DebateError::ConfigurationMissing(format!(
                "{} is not set",
                self.backend.api_key_var()
            )));
        }

        if self.retry_max_attempts == 0 {
            return Err(DebateError::InvalidConfig(
                "retry_max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(DebateError::InvalidConfig("model must not be empty".to_string()));
        }

        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return Err(DebateError::InvalidConfig(format!(
                "history_days must be between 1 and {MAX_HISTORY_DAYS}, got {}",
                self.history_days
            )));
        }

        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for DebateConfig
#[derive(Debug, Default)]
pub struct DebateConfigBuilder {
    backend: Option<LlmBackend>,
    model: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<usize>,
    request_timeout: Option<Duration>,
    retry_max_attempts: Option<u32>,
    retry_backoff_base: Option<Duration>,
    cache_ttl: Option<Duration>,
    cache_dir: Option<PathBuf>,
    history_days: Option<i64>,
    chart_bars: Option<usize>,
    headline_limit: Option<usize>,
    macro_assumptions: Option<MacroAssumptions>,
}

impl DebateConfigBuilder {
    /// Set the LLM backend
    pub fn backend(mut self, backend: LlmBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the backend credential
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom backend base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the per-call output token limit
    pub fn max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Set the LLM request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set maximum attempts per agent
    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.retry_max_attempts = Some(attempts);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set the result cache lifetime
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Persist results as JSON files in this directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the history window in days
    pub fn history_days(mut self, days: i64) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set how many daily bars the result chart carries
    pub fn chart_bars(mut self, bars: usize) -> Self {
        self.chart_bars = Some(bars);
        self
    }

    /// Set the maximum number of headlines
    pub fn headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = Some(limit);
        self
    }

    /// Replace the fixed macro inputs
    pub fn macro_assumptions(mut self, assumptions: MacroAssumptions) -> Self {
        self.macro_assumptions = Some(assumptions);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<DebateConfig> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation
    ///
    /// The orchestrator validates again before any network call, so a
    /// configuration without a credential still fails cleanly at run time.
    pub fn build_unchecked(self) -> DebateConfig {
        let defaults = DebateConfig::default();
        let backend = self.backend.unwrap_or(defaults.backend);

        DebateConfig {
            backend,
            model: self
                .model
                .unwrap_or_else(|| backend.default_model().to_string()),
            api_key: self.api_key,
            api_base: self.api_base,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            retry_max_attempts: self
                .retry_max_attempts
                .unwrap_or(defaults.retry_max_attempts),
            retry_backoff_base: self
                .retry_backoff_base
                .unwrap_or(defaults.retry_backoff_base),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            cache_dir: self.cache_dir,
            history_days: self.history_days.unwrap_or(defaults.history_days),
            chart_bars: self.chart_bars.unwrap_or(defaults.chart_bars),
            headline_limit: self.headline_limit.unwrap_or(defaults.headline_limit),
            vix_fallback: defaults.vix_fallback,
            peg_fallback: defaults.peg_fallback,
            macro_assumptions: self
                .macro_assumptions
                .unwrap_or(defaults.macro_assumptions),
        }
    }
}
