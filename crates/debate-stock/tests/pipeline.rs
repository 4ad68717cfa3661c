//! End-to-end runs of the debate pipeline against in-process fakes

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use debate_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage};
use debate_stock::api::{MarketDataProvider, TickerSuggestion};
use debate_stock::market::{Bar, RawFundamentals};
use debate_stock::{
    AgentRole, AnalysisEvent, AnalysisResult, Clock, DebateConfig, DebateError, DebateOrchestrator,
    FileResultCache, MemoryResultCache, ResultCache,
};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const VERDICT: &str = r#"```json
{
    "Ticker": "ACME",
    "Recommendation_Score": 71,
    "Classification": "Buy",
    "Expected_Trend_1_to_6_Months": "Gradual re-rating toward 115",
    "XAI_Rationale": {
        "Top_Positive_Drivers": ["ROE 31%", "RSI 58 with expanding volume"],
        "Top_Negative_Drivers": ["VIX 18 and P/E premium 12%"]
    },
    "Sub_Scores": { "Fundamental": 74, "Technical": 66, "Sentiment": 50, "Macro_Risk": 45 }
}
```"#;

struct FakeMarketData {
    bars: Vec<Bar>,
    fundamentals: RawFundamentals,
    history_calls: AtomicUsize,
}

impl FakeMarketData {
    fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            fundamentals: RawFundamentals {
                short_name: Some("Acme Corp".to_string()),
                sector: Some("Industrials".to_string()),
                trailing_pe: Some(28.0),
                return_on_equity: Some(0.31),
                debt_to_equity: Some(85.0),
                market_cap: Some(4.2e10),
                beta: Some(1.1),
                ..Default::default()
            },
            history_calls: AtomicUsize::new(0),
        }
    }

    fn with_fundamentals(mut self, fundamentals: RawFundamentals) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn daily_history(
        &self,
        _symbol: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> debate_stock::Result<Vec<Bar>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bars.clone())
    }

    async fn history_range(&self, _: &str, _: &str, _: &str) -> debate_stock::Result<Vec<Bar>> {
        Ok(self.bars.clone())
    }

    async fn fundamentals(&self, _symbol: &str) -> debate_stock::Result<RawFundamentals> {
        Ok(self.fundamentals.clone())
    }

    async fn headlines(&self, symbol: &str, _limit: usize) -> debate_stock::Result<Vec<String>> {
        Ok(vec![format!("{symbol} wins large contract")])
    }

    async fn vix_level(&self) -> debate_stock::Result<f64> {
        Err(DebateError::YahooFinance("VIX feed down".to_string()))
    }

    async fn search(&self, _: &str, _: usize) -> debate_stock::Result<Vec<TickerSuggestion>> {
        Ok(vec![])
    }
}

/// Answers each agent by recognising its prompt
struct ScriptedProvider {
    cio_reply: String,
    bear_failure: Option<fn() -> LLMError>,
    /// When set, Bull answers only after Quant has
    quant_finished: Option<Arc<Notify>>,
    cio_prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            cio_reply: VERDICT.to_string(),
            bear_failure: None,
            quant_finished: None,
            cio_prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn cio_prompts(&self) -> Vec<String> {
        self.cio_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> debate_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.messages.first().map(Message::text).unwrap_or_default();

        let text = if prompt.contains("Chief Investment Officer") {
            self.cio_prompts.lock().unwrap().push(prompt.to_string());
            self.cio_reply.clone()
        } else if prompt.contains("Bearish Risk Manager") {
            if let Some(failure) = self.bear_failure {
                return Err(failure());
            }
            "Macro headwinds and a stretched multiple.".to_string()
        } else if prompt.contains("Bullish Equity Analyst") {
            if let Some(quant_finished) = &self.quant_finished {
                quant_finished.notified().await;
            }
            "Return on equity of 31% funds growth internally.".to_string()
        } else if prompt.contains("Quantitative Analyst") {
            if let Some(quant_finished) = &self.quant_finished {
                quant_finished.notify_one();
            }
            "Momentum positive, RSI not yet overbought.".to_string()
        } else {
            return Err(LLMError::InvalidRequest("unrecognised prompt".to_string()));
        };

        Ok(CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn bars(count: usize) -> Vec<Bar> {
    let mut closes: Vec<f64> = (0..count)
        .map(|i| 90.0 + (i % 9) as f64 + i as f64 * 0.02)
        .collect();
    if count >= 2 {
        closes[count - 2] = 100.0;
        closes[count - 1] = 105.0;
    }

    closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| Bar {
            timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
            open: close - 0.5,
            high: close + 1.5,
            low: close - 1.5,
            close,
            volume: 1_000_000 + (i as u64 % 5) * 10_000,
        })
        .collect()
}

fn config() -> DebateConfig {
    DebateConfig::builder().api_key("test-key").build().unwrap()
}

struct Harness {
    market: Arc<FakeMarketData>,
    llm: Arc<ScriptedProvider>,
    clock: Arc<RecordingClock>,
    orchestrator: DebateOrchestrator,
}

fn harness(
    config: DebateConfig,
    market: FakeMarketData,
    llm: ScriptedProvider,
    cache: Arc<dyn ResultCache>,
) -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let market = Arc::new(market);
    let llm = Arc::new(llm);
    let clock = Arc::new(RecordingClock::default());
    let orchestrator = DebateOrchestrator::new(config, market.clone(), llm.clone(), cache)
        .unwrap()
        .with_clock(clock.clone());
    Harness {
        market,
        llm,
        clock,
        orchestrator,
    }
}

async fn collect(orchestrator: &DebateOrchestrator, ticker: &str) -> Vec<AnalysisEvent> {
    orchestrator.analyze(ticker).collect().await
}

fn terminal_count(events: &[AnalysisEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

fn agents_done(events: &[AnalysisEvent]) -> Vec<AgentRole> {
    events
        .iter()
        .filter_map(|e| match e {
            AnalysisEvent::AgentDone { agent, .. } => Some(*agent),
            _ => None,
        })
        .collect()
}

fn completed(events: &[AnalysisEvent]) -> Option<&AnalysisResult> {
    events.iter().find_map(|e| match e {
        AnalysisEvent::Complete { data } => Some(data.as_ref()),
        _ => None,
    })
}

fn error_message(events: &[AnalysisEvent]) -> Option<&str> {
    events.iter().find_map(|e| match e {
        AnalysisEvent::Error { message } => Some(message.as_str()),
        _ => None,
    })
}

#[tokio::test]
async fn test_successful_run_emits_each_agent_once_before_complete() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(bars(260)), ScriptedProvider::new(), cache);

    let events = collect(&h.orchestrator, "acme").await;

    assert_eq!(terminal_count(&events), 1);
    assert!(matches!(events.last(), Some(AnalysisEvent::Complete { .. })));

    let done = agents_done(&events);
    assert_eq!(done.len(), 3);
    let unique: HashSet<_> = done.into_iter().collect();
    assert_eq!(unique, AgentRole::ALL.into_iter().collect::<HashSet<_>>());

    let statuses: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            AnalysisEvent::Status { message } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(statuses.first(), Some(&"Fetching live market data for ACME..."));
    assert!(statuses.contains(&"Starting 3-Agent Parallel Debate..."));
    assert!(statuses.contains(&"Synthesizing debate (CIO Agent)..."));

    let result = completed(&events).unwrap();
    assert_eq!(result.ticker, "ACME");
    assert_eq!(result.name, "Acme Corp");
    assert_eq!(result.score, 71);
    assert_eq!(result.recommendation, "BUY");
    assert_eq!(result.summary, "Gradual re-rating toward 115");
    assert_eq!(result.chart_data.len(), 30);
    assert_eq!(result.ai_analysis.debate.bull, "Return on equity of 31% funds growth internally.");
    assert_eq!(result.ai_analysis.sub_scores.fundamental, 74);
    // Live VIX failed, so the fallback applies
    assert_eq!(result.breakdown.risk, debate_stock::result::RiskLevel::Low);
    assert_eq!(result.breakdown.valuation, debate_stock::result::ValuationLabel::Premium);
    assert_eq!(result.metrics.debt_to_equity, Some(0.85));

    assert_eq!(h.llm.calls(), 4);
    assert!(h.clock.sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_hit_is_byte_identical_and_skips_debate() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(bars(260)), ScriptedProvider::new(), cache);

    let first = collect(&h.orchestrator, "ACME").await;
    let second = collect(&h.orchestrator, "acme").await;

    assert!(agents_done(&second).is_empty());
    assert_eq!(terminal_count(&second), 1);
    assert_eq!(
        second.first(),
        Some(&AnalysisEvent::status("Cache hit for ACME. Loading..."))
    );
    assert_eq!(
        serde_json::to_string(completed(&first).unwrap()).unwrap(),
        serde_json::to_string(completed(&second).unwrap()).unwrap()
    );
    assert_eq!(h.llm.calls(), 4);
    assert_eq!(h.market.history_calls(), 1);
}

#[tokio::test]
async fn test_file_cache_hit_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(FileResultCache::new(dir.path(), Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(bars(260)), ScriptedProvider::new(), cache);

    let first = collect(&h.orchestrator, "ACME").await;
    let second = collect(&h.orchestrator, "ACME").await;

    assert!(dir.path().join("ACME.json").exists());
    assert_eq!(
        serde_json::to_string(completed(&first).unwrap()).unwrap(),
        serde_json::to_string(completed(&second).unwrap()).unwrap()
    );
    assert_eq!(h.llm.calls(), 4);
}

#[tokio::test]
async fn test_empty_history_is_single_error() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(vec![]), ScriptedProvider::new(), cache.clone());

    let events = collect(&h.orchestrator, "ACME").await;

    assert_eq!(terminal_count(&events), 1);
    assert!(completed(&events).is_none());
    assert!(agents_done(&events).is_empty());
    assert!(error_message(&events).unwrap().contains("Data not available for ACME"));
    assert!(matches!(events.last(), Some(AnalysisEvent::Error { .. })));
    assert_eq!(h.llm.calls(), 0);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_malformed_verdict_is_error_and_not_cached() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let mut llm = ScriptedProvider::new();
    llm.cio_reply = "After weighing everything, I lean towards Buy.".to_string();
    let h = harness(config(), FakeMarketData::new(bars(260)), llm, cache.clone());

    let events = collect(&h.orchestrator, "ACME").await;

    assert_eq!(terminal_count(&events), 1);
    assert!(completed(&events).is_none());
    assert!(error_message(&events).unwrap().contains("invalid verdict"));
    assert_eq!(agents_done(&events).len(), 3);
    // Parse failures are not retried
    assert_eq!(h.llm.calls(), 4);
    assert!(cache.get("ACME").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_call() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let config = DebateConfig::builder().build_unchecked();
    let h = harness(config, FakeMarketData::new(bars(260)), ScriptedProvider::new(), cache);

    let events = collect(&h.orchestrator, "ACME").await;

    assert_eq!(events.len(), 1);
    assert!(error_message(&events).unwrap().contains("GEMINI_API_KEY"));
    assert_eq!(h.llm.calls(), 0);
    assert_eq!(h.market.history_calls(), 0);
}

#[tokio::test]
async fn test_invalid_ticker_is_rejected() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(bars(260)), ScriptedProvider::new(), cache);

    let events = collect(&h.orchestrator, "WAYTOOLONGTICKER").await;

    assert_eq!(events.len(), 1);
    assert!(error_message(&events).unwrap().starts_with("Invalid symbol"));
    assert_eq!(h.market.history_calls(), 0);

    let events = collect(&h.orchestrator, "../x").await;
    assert_eq!(events.len(), 1);
    assert!(error_message(&events).unwrap().contains("unsupported character '/'"));
    assert_eq!(h.market.history_calls(), 0);
}

#[tokio::test]
async fn test_rate_limited_agent_exhausts_retries() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let mut llm = ScriptedProvider::new();
    llm.bear_failure = Some(|| LLMError::RateLimitExceeded("429 Too Many Requests".to_string()));
    let h = harness(config(), FakeMarketData::new(bars(260)), llm, cache.clone());

    let events = collect(&h.orchestrator, "ACME").await;

    assert_eq!(terminal_count(&events), 1);
    assert!(completed(&events).is_none());
    assert!(!agents_done(&events).contains(&AgentRole::Bear));
    assert_eq!(
        error_message(&events).unwrap(),
        "Agent 'bear' failed after 3 attempts: Rate limit exceeded: 429 Too Many Requests"
    );
    assert_eq!(
        *h.clock.sleeps.lock().unwrap(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_failed_analyst_is_not_retried_and_nothing_is_cached() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let mut llm = ScriptedProvider::new();
    llm.bear_failure = Some(|| LLMError::AuthenticationFailed);
    let h = harness(config(), FakeMarketData::new(bars(260)), llm, cache.clone());

    let events = collect(&h.orchestrator, "ACME").await;

    assert_eq!(terminal_count(&events), 1);
    assert!(completed(&events).is_none());
    assert!(matches!(events.last(), Some(AnalysisEvent::Error { .. })));
    assert!(!agents_done(&events).contains(&AgentRole::Bear));
    assert!(
        error_message(&events)
            .unwrap()
            .contains("Invalid API key or authentication failed")
    );
    // The adjudicator never runs and the failure is attempted once
    assert!(h.llm.cio_prompts().is_empty());
    assert!(h.clock.sleeps.lock().unwrap().is_empty());
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_verdict_does_not_depend_on_finish_order() {
    let in_order = harness(
        config(),
        FakeMarketData::new(bars(260)),
        ScriptedProvider::new(),
        Arc::new(MemoryResultCache::new(Duration::from_secs(3600))),
    );
    let mut llm = ScriptedProvider::new();
    llm.quant_finished = Some(Arc::new(Notify::new()));
    let reordered = harness(
        config(),
        FakeMarketData::new(bars(260)),
        llm,
        Arc::new(MemoryResultCache::new(Duration::from_secs(3600))),
    );

    let first = collect(&in_order.orchestrator, "ACME").await;
    let second = collect(&reordered.orchestrator, "ACME").await;

    let finish_order = agents_done(&second);
    assert_eq!(finish_order.len(), 3);
    assert_eq!(finish_order.last(), Some(&AgentRole::Bull));
    assert_ne!(agents_done(&first), finish_order);

    let cio_prompt = in_order.llm.cio_prompts();
    assert_eq!(cio_prompt.len(), 1);
    assert_eq!(cio_prompt, reordered.llm.cio_prompts());

    // Sections appear as Bull, Bear, Quant whatever the arrival order
    let prompt = &cio_prompt[0];
    let bull = prompt.find("Return on equity of 31%").unwrap();
    let bear = prompt.find("Macro headwinds").unwrap();
    let quant = prompt.find("Momentum positive").unwrap();
    assert!(bull < bear && bear < quant);

    assert_eq!(
        serde_json::to_string(completed(&first).unwrap()).unwrap(),
        serde_json::to_string(completed(&second).unwrap()).unwrap()
    );
}

#[tokio::test]
async fn test_implausible_provider_change_is_recomputed() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let market = FakeMarketData::new(bars(260)).with_fundamentals(RawFundamentals {
        regular_market_change_percent: Some(0.40),
        ..Default::default()
    });
    let h = harness(config(), market, ScriptedProvider::new(), cache);

    let result = h.orchestrator.run_analysis("ACME").await.unwrap();

    assert_eq!(result.change_percent, 5.0);
    assert_eq!(result.name, "ACME");
    assert_eq!(result.price, 105.0);
    assert_eq!(result.market_cap, 0);
}

#[tokio::test]
async fn test_short_history_still_completes() {
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let h = harness(config(), FakeMarketData::new(bars(5)), ScriptedProvider::new(), cache);

    let result = h.orchestrator.run_analysis("ACME").await.unwrap();

    assert_eq!(result.technicals.sma_50, None);
    assert_eq!(result.technicals.rsi_14, None);
    assert_eq!(result.chart_data.len(), 5);
}
