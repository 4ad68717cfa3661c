//! Market data provider abstraction and the Yahoo Finance implementation

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::market::{Bar, RawFundamentals};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticker suggestion returned by symbol search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSuggestion {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

/// Source of prices, fundamentals and news
///
/// Implementations are expected to be unreliable. Callers decide which
/// failures are fatal.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars between `start` and `end`, oldest first
    async fn daily_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>>;

    /// Bars for a named period and interval, e.g. `"5d"` / `"15m"`
    async fn history_range(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<Bar>>;

    /// Latest company fields
    async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals>;

    /// Up to `limit` recent headline titles
    async fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<String>>;

    /// Latest CBOE volatility index close
    async fn vix_level(&self) -> Result<f64>;

    /// Symbols matching a free-text query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TickerSuggestion>>;
}
