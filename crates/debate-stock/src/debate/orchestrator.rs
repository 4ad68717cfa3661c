//! Drives one analysis from ticker to verdict
//!
//! ```text
//! Idle -> FetchingData -> ParallelDebate -> Synthesizing -> Parsing -> Done
//!   \__________________________________________________________/-> Failed
//! ```
//!
//! A cache hit goes straight from `Idle` to `Done`.

use super::{DebateTranscript, Verdict};
use crate::api::MarketDataProvider;
use crate::assembler::assemble;
use crate::cache::ResultCache;
use crate::chart::validate_ticker;
use crate::config::DebateConfig;
use crate::error::Result;
use crate::events::AnalysisEvent;
use crate::market::{AgentViews, MarketDataNormalizer};
use crate::prompts::PromptSegmenter;
use crate::result::AnalysisResult;
use crate::retry::Clock;
use crate::runner::AgentRunner;
use debate_llm::LLMProvider;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{self, BoxStream, FuturesUnordered};
use futures::{StreamExt, future};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Name the adjudicator is invoked under
const CIO_AGENT: &str = "cio";

/// Stage of a single analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    FetchingData,
    ParallelDebate,
    Synthesizing,
    Parsing,
    Done,
    Failed,
}

impl PipelineState {
    /// `Done` and `Failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor
    pub fn can_advance_to(self, next: Self) -> bool {
        match next {
            Self::Failed => !self.is_terminal(),
            _ => matches!(
                (self, next),
                (Self::Idle, Self::FetchingData | Self::Done)
                    | (Self::FetchingData, Self::ParallelDebate)
                    | (Self::ParallelDebate, Self::Synthesizing)
                    | (Self::Synthesizing, Self::Parsing)
                    | (Self::Parsing, Self::Done)
            ),
        }
    }
}

struct StateTracker<'a> {
    ticker: &'a str,
    state: PipelineState,
}

impl<'a> StateTracker<'a> {
    fn new(ticker: &'a str) -> Self {
        Self {
            ticker,
            state: PipelineState::Idle,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        debug!(ticker = self.ticker, from = ?self.state, to = ?next, "Pipeline transition");
        self.state = next;
    }
}

struct EventSink(UnboundedSender<AnalysisEvent>);

impl EventSink {
    fn send(&self, event: AnalysisEvent) {
        // A dropped receiver means nobody is listening
        let _ = self.0.unbounded_send(event);
    }

    fn status(&self, message: impl Into<String>) {
        self.send(AnalysisEvent::status(message));
    }
}

/// Runs the full debate for a ticker and reports progress as events
pub struct DebateOrchestrator {
    config: Arc<DebateConfig>,
    normalizer: MarketDataNormalizer,
    segmenter: PromptSegmenter,
    runner: AgentRunner,
    cache: Arc<dyn ResultCache>,
}

impl DebateOrchestrator {
    /// Wire the pipeline together
    ///
    /// The configuration is not validated here; a missing credential is
    /// reported as the first event of each run.
    pub fn new(
        config: DebateConfig,
        market: Arc<dyn MarketDataProvider>,
        llm: Arc<dyn LLMProvider>,
        cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        Ok(Self {
            normalizer: MarketDataNormalizer::new(market, Arc::clone(&config)),
            segmenter: PromptSegmenter::new()?,
            runner: AgentRunner::new(llm, &config),
            cache,
            config,
        })
    }

    /// Replace the clock used for retry backoff
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.runner = self.runner.with_clock(clock);
        self
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Stream of progress events ending in exactly one `complete` or `error`
    ///
    /// Work happens only while the stream is polled. Dropping it abandons any
    /// in-flight calls and nothing is cached.
    pub fn analyze(&self, ticker: &str) -> BoxStream<'_, AnalysisEvent> {
        let (tx, rx) = mpsc::unbounded();
        let driver = self.drive(ticker.to_string(), EventSink(tx));
        let driver = stream::once(driver).filter_map(|()| future::ready(None::<AnalysisEvent>));
        stream::select(driver, rx).boxed()
    }

    /// Run to completion without progress events
    pub async fn run_analysis(&self, ticker: &str) -> Result<AnalysisResult> {
        let (tx, _) = mpsc::unbounded();
        self.run(ticker, &EventSink(tx)).await
    }

    async fn drive(&self, ticker: String, sink: EventSink) {
        match self.run(&ticker, &sink).await {
            Ok(result) => sink.send(AnalysisEvent::Complete {
                data: Box::new(result),
            }),
            Err(e) => {
                error!(ticker = %ticker, error = %e, "Analysis failed");
                sink.send(AnalysisEvent::error(e.to_string()));
            }
        }
    }

    #[instrument(skip(self, sink), fields(model = %self.config.model))]
    async fn run(&self, ticker: &str, sink: &EventSink) -> Result<AnalysisResult> {
        self.config.validate()?;
        let ticker = validate_ticker(ticker)?;

        let mut state = StateTracker::new(&ticker);
        let outcome = self.pipeline(&ticker, sink, &mut state).await;
        if outcome.is_err() {
            state.advance(PipelineState::Failed);
        }
        outcome
    }

    async fn pipeline(
        &self,
        ticker: &str,
        sink: &EventSink,
        state: &mut StateTracker<'_>,
    ) -> Result<AnalysisResult> {
        if let Some(hit) = self.cached(ticker).await {
            sink.status(format!("Cache hit for {ticker}. Loading..."));
            state.advance(PipelineState::Done);
            return Ok(hit);
        }

        sink.status(format!("Fetching live market data for {ticker}..."));
        state.advance(PipelineState::FetchingData);
        let data = self.normalizer.collect(ticker).await?;
        let views = AgentViews::build(&data, &self.config);
        let prompts = self.segmenter.debate_prompts(&views)?;

        sink.status("Starting 3-Agent Parallel Debate...");
        state.advance(PipelineState::ParallelDebate);
        let mut pending: FuturesUnordered<_> = prompts
            .into_iter()
            .map(|(role, prompt)| async move {
                let outcome = self.runner.invoke(role.as_str(), &prompt, false).await;
                (role, outcome)
            })
            .collect();

        let mut transcript = DebateTranscript::new();
        while let Some((role, outcome)) = pending.next().await {
            let text = outcome?;
            info!(ticker, agent = %role, chars = text.len(), "Analyst finished");
            sink.send(AnalysisEvent::AgentDone {
                agent: role,
                text: text.clone(),
            });
            transcript.record(role, text);
        }
        let debate = transcript.into_record()?;

        sink.status("Synthesizing debate (CIO Agent)...");
        state.advance(PipelineState::Synthesizing);
        let prompt = self.segmenter.cio_prompt(&views, &debate)?;
        let raw = self.runner.invoke(CIO_AGENT, &prompt, true).await?;

        state.advance(PipelineState::Parsing);
        let verdict = Verdict::parse(&raw, ticker)?;
        let result = assemble(&data, &views, &verdict, debate, self.config.chart_bars);

        if let Err(e) = self.cache.put(ticker, &result).await {
            warn!(ticker, error = %e, "Failed to cache analysis");
        }
        state.advance(PipelineState::Done);
        info!(
            ticker,
            score = result.score,
            recommendation = %result.recommendation,
            "Analysis complete"
        );
        Ok(result)
    }

    async fn cached(&self, ticker: &str) -> Option<AnalysisResult> {
        match self.cache.get(ticker).await {
            Ok(Some(hit)) => {
                debug!(ticker, "Cache hit");
                Some(hit)
            }
            Ok(None) => {
                debug!(ticker, "Cache miss");
                None
            }
            Err(e) => {
                warn!(ticker, error = %e, "Cache read failed, running a fresh analysis");
                None
            }
        }
    }
}
