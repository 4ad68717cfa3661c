//! Lightweight lookups outside the debate: history charts, quote cards, search

use crate::api::{MarketDataProvider, TickerSuggestion};
use crate::assembler::{change_percent, market_cap};
use crate::error::{DebateError, Result};
use crate::market::{Bar, round_to};
use crate::result::ChartPoint;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Longest accepted ticker symbol
pub const MAX_TICKER_LEN: usize = 10;

/// Intervals whose points are keyed by unix seconds rather than a date
pub const INTRADAY_INTERVALS: &[&str] = &["1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h"];

/// Suggestions returned by [`search_tickers`]
pub const SEARCH_LIMIT: usize = 5;

/// Punctuation allowed in a symbol besides ASCII letters and digits, e.g. `BRK-B`, `^VIX`, `GC=F`
const TICKER_PUNCTUATION: &[char] = &['.', '^', '=', '-'];

/// Trim, check length and characters, and upper-case a ticker
///
/// The result is used as a file name and a URL path segment, so only ASCII
/// alphanumerics and [`TICKER_PUNCTUATION`] pass.
pub fn validate_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(DebateError::InvalidSymbol("ticker must not be empty".to_string()));
    }
    if ticker.chars().count() > MAX_TICKER_LEN {
        return Err(DebateError::InvalidSymbol(format!(
            "{ticker} is longer than {MAX_TICKER_LEN} characters"
        )));
    }
    if let Some(bad) = ticker
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !TICKER_PUNCTUATION.contains(c))
    {
        return Err(DebateError::InvalidSymbol(format!(
            "{ticker} contains unsupported character '{bad}'"
        )));
    }
    Ok(ticker.to_ascii_uppercase())
}

/// Chart x-axis value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartTime {
    /// Unix seconds, for intraday intervals
    Unix(i64),
    /// `YYYY-MM-DD`
    Date(String),
}

/// One point of a period/interval chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub time: ChartTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Same as `close`, for line charts
    pub value: f64,
    pub volume: u64,
}

impl HistoryPoint {
    fn from_bar(bar: &Bar, intraday: bool) -> Self {
        let time = if intraday {
            ChartTime::Unix(bar.timestamp.timestamp())
        } else {
            ChartTime::Date(bar.timestamp.format("%Y-%m-%d").to_string())
        };
        let close = round_to(bar.close, 2);
        Self {
            time,
            open: round_to(bar.open, 2),
            high: round_to(bar.high, 2),
            low: round_to(bar.low, 2),
            close,
            value: close,
            volume: bar.volume,
        }
    }
}

/// OHLC series for `period` sampled at `interval`
#[instrument(skip(provider))]
pub async fn history_chart(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    period: &str,
    interval: &str,
) -> Result<Vec<HistoryPoint>> {
    let ticker = validate_ticker(ticker)?;
    let intraday = INTRADAY_INTERVALS.contains(&interval);

    let bars = provider.history_range(&ticker, period, interval).await?;
    Ok(bars
        .iter()
        .map(|bar| HistoryPoint::from_bar(bar, intraday))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMetrics {
    pub pe_ratio: Option<f64>,
    pub beta: Option<f64>,
}

/// Quote card for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
    pub market_cap: u64,
    pub metrics: QuickMetrics,
    #[serde(rename = "chartData")]
    pub chart_data: Vec<ChartPoint>,
}

/// Price, change, headline multiples and a one-month chart
///
/// Missing fundamentals degrade to unknowns; missing history is an error.
#[instrument(skip(provider))]
pub async fn quick_stats(provider: &dyn MarketDataProvider, ticker: &str) -> Result<QuickStats> {
    let ticker = validate_ticker(ticker)?;

    let (bars, fundamentals) = tokio::join!(
        provider.history_range(&ticker, "1mo", "1d"),
        provider.fundamentals(&ticker),
    );
    let bars = bars?;
    let fundamentals = fundamentals
        .inspect_err(|e| warn!(ticker, error = %e, "Fundamentals unavailable for quick stats"))
        .unwrap_or_default()
        .sanitized();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let last_close = closes.last().copied().unwrap_or(0.0);
    let price = fundamentals
        .current_price
        .filter(|p| *p > 0.0)
        .unwrap_or(last_close);

    Ok(QuickStats {
        name: fundamentals.display_name(&ticker),
        price: round_to(price, 2),
        change_percent: change_percent(fundamentals.regular_market_change_percent, &closes),
        market_cap: market_cap(fundamentals.market_cap),
        metrics: QuickMetrics {
            pe_ratio: fundamentals.trailing_pe,
            beta: fundamentals.beta,
        },
        chart_data: bars.iter().map(ChartPoint::from).collect(),
        ticker,
    })
}

/// Up to five symbol suggestions; any failure yields an empty list
#[instrument(skip(provider))]
pub async fn search_tickers(provider: &dyn MarketDataProvider, query: &str) -> Vec<TickerSuggestion> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    match provider.search(query, SEARCH_LIMIT).await {
        Ok(mut suggestions) => {
            suggestions.truncate(SEARCH_LIMIT);
            suggestions
        }
        Err(e) => {
            warn!(query, error = %e, "Ticker search failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::RawFundamentals;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    struct StubProvider {
        bars: Vec<Bar>,
        fundamentals: Option<RawFundamentals>,
        search_fails: bool,
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn daily_history(&self, _: &str, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<Vec<Bar>> {
            Ok(self.bars.clone())
        }

        async fn history_range(&self, _: &str, _: &str, _: &str) -> Result<Vec<Bar>> {
            Ok(self.bars.clone())
        }

        async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals> {
            self.fundamentals
                .clone()
                .ok_or_else(|| DebateError::YahooFinance(format!("no quote for {symbol}")))
        }

        async fn headlines(&self, _: &str, _: usize) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn vix_level(&self) -> Result<f64> {
            Ok(15.0)
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<TickerSuggestion>> {
            if self.search_fails {
                return Err(DebateError::Api("search down".to_string()));
            }
            Ok((0..limit + 3)
                .map(|i| TickerSuggestion {
                    symbol: format!("{query}{i}"),
                    name: format!("{query} {i}"),
                    exchange: "NMS".to_string(),
                })
                .collect())
        }
    }

    fn stub(fundamentals: Option<RawFundamentals>) -> StubProvider {
        let bars = vec![
            Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap(),
                open: 10.004,
                high: 11.0,
                low: 9.5,
                close: 10.0,
                volume: 500,
            },
            Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 2, 13, 30, 0).unwrap(),
                open: 10.0,
                high: 11.5,
                low: 9.9,
                close: 11.0,
                volume: 700,
            },
        ];
        StubProvider {
            bars,
            fundamentals,
            search_fails: false,
        }
    }

    #[test]
    fn test_validate_ticker() {
        assert_eq!(validate_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(validate_ticker("brk-b").unwrap(), "BRK-B");
        assert!(matches!(validate_ticker(""), Err(DebateError::InvalidSymbol(_))));
        assert!(matches!(validate_ticker("   "), Err(DebateError::InvalidSymbol(_))));
        assert!(validate_ticker("ABCDEFGHIJ").is_ok());
        assert!(validate_ticker("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn test_validate_ticker_charset() {
        assert_eq!(validate_ticker("^vix").unwrap(), "^VIX");
        assert_eq!(validate_ticker("gc=f").unwrap(), "GC=F");
        assert_eq!(validate_ticker("rds.a").unwrap(), "RDS.A");

        for bad in ["../x", "a/b", "a\\b", "AAPL MSFT", "A?B", "ÄPPL", "T%2F"] {
            assert!(
                matches!(validate_ticker(bad), Err(DebateError::InvalidSymbol(_))),
                "{bad} accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_daily_chart_uses_dates() {
        let points = history_chart(&stub(None), "acme", "1mo", "1d").await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, ChartTime::Date("2024-05-01".to_string()));
        assert_eq!(points[0].open, 10.0);
        assert_eq!(points[1].value, points[1].close);

        let json = serde_json::to_value(&points[0]).unwrap();
        assert_eq!(json["time"], "2024-05-01");
    }

    #[tokio::test]
    async fn test_intraday_chart_uses_unix_seconds() {
        let points = history_chart(&stub(None), "acme", "5d", "15m").await.unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap().timestamp();
        assert_eq!(points[0].time, ChartTime::Unix(expected));

        let json = serde_json::to_value(&points[0]).unwrap();
        assert_eq!(json["time"], expected);
    }

    #[tokio::test]
    async fn test_chart_rejects_bad_ticker() {
        let result = history_chart(&stub(None), "", "1mo", "1d").await;
        assert!(matches!(result, Err(DebateError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_quick_stats() {
        let raw = RawFundamentals {
            short_name: Some("Acme".to_string()),
            current_price: Some(11.25),
            trailing_pe: Some(18.0),
            market_cap: Some(5.0e8),
            regular_market_change_percent: Some(0.015),
            ..Default::default()
        };
        let stats = quick_stats(&stub(Some(raw)), "acme").await.unwrap();
        assert_eq!(stats.ticker, "ACME");
        assert_eq!(stats.name, "Acme");
        assert_eq!(stats.price, 11.25);
        assert_eq!(stats.change_percent, 1.5);
        assert_eq!(stats.market_cap, 500_000_000);
        assert_eq!(stats.metrics.pe_ratio, Some(18.0));
        assert_eq!(stats.metrics.beta, None);
        assert_eq!(stats.chart_data[1].date, "05/02");
    }

    #[tokio::test]
    async fn test_quick_stats_without_fundamentals() {
        let stats = quick_stats(&stub(None), "acme").await.unwrap();
        assert_eq!(stats.name, "ACME");
        assert_eq!(stats.price, 11.0);
        assert_eq!(stats.change_percent, 10.0);
        assert_eq!(stats.market_cap, 0);
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let suggestions = search_tickers(&stub(None), "AP").await;
        assert_eq!(suggestions.len(), SEARCH_LIMIT);
        assert_eq!(suggestions[0].symbol, "AP0");
    }

    #[tokio::test]
    async fn test_search_failure_is_empty() {
        let mut provider = stub(None);
        provider.search_fails = true;
        assert!(search_tickers(&provider, "AP").await.is_empty());
        assert!(search_tickers(&stub(None), "  ").await.is_empty());
    }
}
