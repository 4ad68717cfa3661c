//! Yahoo Finance API client
//!
//! Price history goes through `yahoo_finance_api`. Fundamentals, news and
//! symbol search use Yahoo's JSON endpoints directly since the crate does not
//! cover them.

use super::{MarketDataProvider, TickerSuggestion};
use crate::error::{DebateError, Result};
use crate::market::{Bar, RawFundamentals};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const QUERY_BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_SEED_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";
const VIX_SYMBOL: &str = "^VIX";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooFinanceClient {
    connector: Arc<yahoo::YahooConnector>,
    http: Client,
    base_url: String,
    crumb: Arc<OnceCell<String>>,
    rate_limiter: SharedRateLimiter,
}

impl YahooFinanceClient {
    /// Create a client allowing 4 JSON requests per second
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(4)
    }

    /// Create a client with a custom JSON request rate
    pub fn with_rate_limit(requests_per_second: u32) -> Result<Self> {
        let connector = yahoo::YahooConnector::new().map_err(yahoo_error)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            connector: Arc::new(connector),
            http,
            base_url: QUERY_BASE_URL.to_string(),
            crumb: Arc::new(OnceCell::new()),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Session crumb required by the quote summary endpoint
    async fn crumb(&self) -> Result<&str> {
        self.crumb
            .get_or_try_init(|| async {
                // The seed response is usually a 404; only its cookies matter
                let _ = self.http.get(COOKIE_SEED_URL).send().await;

                let crumb = self
                    .http
                    .get(format!("{}/v1/test/getcrumb", self.base_url))
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                if crumb.trim().is_empty() || crumb.contains('<') {
                    return Err(DebateError::YahooFinance(
                        "could not obtain session crumb".to_string(),
                    ));
                }
                Ok(crumb.trim().to_string())
            })
            .await
            .map(String::as_str)
    }

    async fn search_endpoint(
        &self,
        query: &str,
        quotes: usize,
        news: usize,
    ) -> Result<SearchResponse> {
        self.rate_limiter.until_ready().await;

        let response = self
            .http
            .get(format!("{}/v1/finance/search", self.base_url))
            .query(&[
                ("q", query.to_string()),
                ("quotesCount", quotes.to_string()),
                ("newsCount", news.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn daily_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DebateError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DebateError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(yahoo_error)?;
        let quotes = response.quotes().map_err(yahoo_error)?;

        let bars: Vec<Bar> = quotes.iter().filter_map(to_bar).collect();
        debug!(symbol, bars = bars.len(), "Fetched daily history");
        Ok(bars)
    }

    #[instrument(skip(self))]
    async fn history_range(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<Bar>> {
        let response = self
            .connector
            .get_quote_range(symbol, interval, period)
            .await
            .map_err(yahoo_error)?;
        let quotes = response.quotes().map_err(yahoo_error)?;

        Ok(quotes.iter().filter_map(to_bar).collect())
    }

    #[instrument(skip(self))]
    async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals> {
        let crumb = self.crumb().await?;
        self.rate_limiter.until_ready().await;

        let envelope: QuoteSummaryEnvelope = self
            .http
            .get(format!(
                "{}/v10/finance/quoteSummary/{symbol}",
                self.base_url
            ))
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let modules = envelope
            .quote_summary
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.swap_remove(0)))
            .ok_or_else(|| {
                DebateError::YahooFinance(format!("no quote summary returned for {symbol}"))
            })?;

        Ok(modules.into_fundamentals())
    }

    #[instrument(skip(self))]
    async fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<String>> {
        let response = self.search_endpoint(symbol, 0, limit).await?;
        Ok(response
            .news
            .into_iter()
            .filter_map(|n| n.title)
            .filter(|t| !t.trim().is_empty())
            .take(limit)
            .collect())
    }

    #[instrument(skip(self))]
    async fn vix_level(&self) -> Result<f64> {
        let response = self
            .connector
            .get_quote_range(VIX_SYMBOL, "1d", "5d")
            .await
            .map_err(yahoo_error)?;
        let quote = response.last_quote().map_err(yahoo_error)?;

        if quote.close.is_finite() && quote.close > 0.0 {
            Ok(quote.close)
        } else {
            Err(DebateError::YahooFinance("VIX close missing".to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TickerSuggestion>> {
        let response = self.search_endpoint(query, limit, 0).await?;
        Ok(response
            .quotes
            .into_iter()
            .filter_map(|q| {
                Some(TickerSuggestion {
                    symbol: q.symbol?,
                    name: q.shortname?,
                    exchange: q.exchange.unwrap_or_else(|| "N/A".to_string()),
                })
            })
            .take(limit)
            .collect())
    }
}

fn yahoo_error(err: impl std::fmt::Display) -> DebateError {
    DebateError::YahooFinance(err.to_string())
}

fn to_bar(quote: &yahoo::Quote) -> Option<Bar> {
    if !quote.close.is_finite() {
        return None;
    }
    Some(Bar {
        timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0)?,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
    })
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<SummaryModules>>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}` or `{}`
#[derive(Debug, Default, Deserialize)]
struct YahooNumber {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryModules {
    price: PriceModule,
    summary_detail: SummaryDetail,
    default_key_statistics: KeyStatistics,
    financial_data: FinancialData,
    asset_profile: AssetProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: YahooNumber,
    regular_market_change_percent: YahooNumber,
    market_cap: YahooNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: YahooNumber,
    beta: YahooNumber,
    #[serde(rename = "marketCap")]
    market_cap: YahooNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    peg_ratio: YahooNumber,
    price_to_book: YahooNumber,
    earnings_quarterly_growth: YahooNumber,
    beta: YahooNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    current_price: YahooNumber,
    return_on_equity: YahooNumber,
    debt_to_equity: YahooNumber,
    free_cashflow: YahooNumber,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfile {
    sector: Option<String>,
}

impl SummaryModules {
    fn into_fundamentals(self) -> RawFundamentals {
        RawFundamentals {
            short_name: self.price.short_name,
            long_name: self.price.long_name,
            sector: self.asset_profile.sector.filter(|s| !s.is_empty()),
            current_price: self
                .financial_data
                .current_price
                .raw
                .or(self.price.regular_market_price.raw),
            trailing_pe: self.summary_detail.trailing_pe.raw,
            peg_ratio: self.default_key_statistics.peg_ratio.raw,
            price_to_book: self.default_key_statistics.price_to_book.raw,
            return_on_equity: self.financial_data.return_on_equity.raw,
            debt_to_equity: self.financial_data.debt_to_equity.raw,
            free_cashflow: self.financial_data.free_cashflow.raw,
            market_cap: self
                .price
                .market_cap
                .raw
                .or(self.summary_detail.market_cap.raw),
            beta: self
                .summary_detail
                .beta
                .raw
                .or(self.default_key_statistics.beta.raw),
            earnings_quarterly_growth: self.default_key_statistics.earnings_quarterly_growth.raw,
            regular_market_change_percent: self.price.regular_market_change_percent.raw,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    quotes: Vec<SearchQuote>,
    news: Vec<SearchNews>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    exchange: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchNews {
    title: Option<String>,
}
