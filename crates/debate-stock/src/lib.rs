//! Multi-agent equity research debate engine
//!
//! Given a ticker, this crate produces a research verdict by letting three
//! language-model analysts argue over disjoint slices of market data and a
//! fourth agent adjudicate. It includes:
//!
//! - Market data retrieval (Yahoo Finance) and normalization into
//!   agent-safe payloads with derived technical indicators
//! - Role-scoped prompt rendering (MiniJinja templates)
//! - Agent invocation with bounded exponential backoff on rate limits
//! - The debate orchestrator: Bull, Bear and Quant in parallel, then the CIO
//! - Result assembly, a time-bounded result cache and a progress event stream
//! - Auxiliary lookups: history charts, quote cards and ticker search
//!
//! # Architecture
//!
//! ```text
//! MarketDataNormalizer -> PromptSegmenter -> DebateOrchestrator -> assemble -> ResultCache
//!                                              |  AgentRunner x3 (parallel)
//!                                              |  AgentRunner (CIO)
//!                                              v
//!                                        AnalysisEvent stream
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use debate_stock::{DebateConfig, DebateOrchestrator, MemoryResultCache, YahooFinanceClient};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DebateConfig::from_env()?;
//!     let orchestrator = DebateOrchestrator::new(
//!         config.clone(),
//!         Arc::new(YahooFinanceClient::new()?),
//!         /* your LLM provider */,
//!         Arc::new(MemoryResultCache::new(config.cache_ttl)),
//!     )?;
//!
//!     let mut events = orchestrator.analyze("AAPL");
//!     while let Some(event) = events.next().await {
//!         print!("{}", event.to_sse()?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod assembler;
pub mod cache;
pub mod chart;
pub mod config;
pub mod debate;
pub mod error;
pub mod events;
pub mod market;
pub mod prompts;
pub mod result;
pub mod retry;
pub mod runner;

// Re-export main types for convenience
pub use api::{MarketDataProvider, TickerSuggestion, YahooFinanceClient};
pub use cache::{FileResultCache, MemoryResultCache, ResultCache};
pub use chart::{HistoryPoint, QuickStats, history_chart, quick_stats, search_tickers, validate_ticker};
pub use config::{DebateConfig, LlmBackend, MacroAssumptions};
pub use debate::{AgentRole, Classification, DebateOrchestrator, PipelineState, Verdict};
pub use error::{DebateError, Result};
pub use events::AnalysisEvent;
pub use prompts::PromptSegmenter;
pub use result::AnalysisResult;
pub use retry::{Clock, RetryPolicy, TokioClock};
pub use runner::AgentRunner;
