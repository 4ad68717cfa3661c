//! Single-agent invocation with rate-limit retry

use crate::config::DebateConfig;
use crate::error::{DebateError, Result};
use crate::retry::{Clock, RetryPolicy, TokioClock};
use debate_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Sends one prompt to the language model and returns its text
///
/// Rate-limit failures are retried with exponential backoff up to the
/// policy's attempt budget. Every other failure is returned immediately.
pub struct AgentRunner {
    provider: Arc<dyn LLMProvider>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl AgentRunner {
    /// Create a runner using the model settings and retry policy from `config`
    pub fn new(provider: Arc<dyn LLMProvider>, config: &DebateConfig) -> Self {
        Self {
            provider,
            policy: RetryPolicy::new(config.retry_max_attempts, config.retry_backoff_base),
            clock: Arc::new(TokioClock),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }

    /// Replace the clock used between attempts
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active retry policy
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `prompt` as `agent`; `structured` requests JSON output
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn invoke(&self, agent: &str, prompt: &str, structured: bool) -> Result<String> {
        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .json_output(structured)
            .build();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    debug!(agent, attempt, tokens = response.usage.total(), "Agent finished");
                    return Ok(response.text().to_string());
                }
                Err(err) if err.is_rate_limit() => {
                    if attempt >= self.policy.max_attempts {
                        warn!(agent, attempt, error = %err, "Agent out of attempts");
                        return Err(DebateError::AgentExhausted {
                            agent: agent.to_string(),
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    let delay = self.policy.backoff(attempt - 1);
                    warn!(agent, attempt, delay_secs = delay.as_secs_f64(), "Rate limited, backing off");
                    self.clock.sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
