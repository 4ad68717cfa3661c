//! Fetch and sanitize market data for one ticker

use super::{DerivedMetrics, MarketSnapshot, RawFundamentals, round_to};
use crate::api::MarketDataProvider;
use crate::config::DebateConfig;
use crate::error::{DebateError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Snapshot plus the indicators computed from it
#[derive(Debug, Clone)]
pub struct NormalizedMarketData {
    pub snapshot: MarketSnapshot,
    pub metrics: DerivedMetrics,
}

/// Fetches raw data and produces agent-safe values
pub struct MarketDataNormalizer {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<DebateConfig>,
}

impl MarketDataNormalizer {
    /// Create a normalizer over a data provider
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: Arc<DebateConfig>) -> Self {
        Self { provider, config }
    }

    /// Fetch everything needed for a debate
    ///
    /// Only missing price history is fatal. Fundamentals, VIX and headline
    /// failures are logged and replaced with unknowns or fallbacks.
    #[instrument(skip(self), fields(history_days = self.config.history_days))]
    pub async fn collect(&self, ticker: &str) -> Result<NormalizedMarketData> {
        let end = Utc::now();
        let start = chrono::Duration::try_days(self.config.history_days)
            .and_then(|window| end.checked_sub_signed(window))
            .ok_or_else(|| {
                DebateError::InvalidConfig(format!(
                    "history window of {} days is out of range",
                    self.config.history_days
                ))
            })?;

        let (history, fundamentals, vix, headlines) = tokio::join!(
            self.provider.daily_history(ticker, start, end),
            self.provider.fundamentals(ticker),
            self.provider.vix_level(),
            self.provider.headlines(ticker, self.config.headline_limit),
        );

        let history = history.map_err(|e| match e {
            DebateError::DataUnavailable { .. } => e,
            other => DebateError::data_unavailable(ticker, other.to_string()),
        })?;
        if history.is_empty() {
            return Err(DebateError::data_unavailable(
                ticker,
                "could not retrieve historical data",
            ));
        }

        let fundamentals = fundamentals
            .inspect_err(|e| warn!(ticker, error = %e, "Fundamentals unavailable, continuing without them"))
            .unwrap_or_default()
            .sanitized();

        let vix_level = match vix {
            Ok(level) if level.is_finite() => round_to(level, 2),
            Ok(_) => self.config.vix_fallback,
            Err(e) => {
                warn!(error = %e, fallback = self.config.vix_fallback, "VIX unavailable");
                self.config.vix_fallback
            }
        };

        let headlines = headlines
            .inspect_err(|e| warn!(ticker, error = %e, "Headlines unavailable"))
            .unwrap_or_default()
            .into_iter()
            .take(self.config.headline_limit)
            .collect();

        let last_close = history.last().map_or(0.0, |b| b.close);
        let current_price = resolve_current_price(&fundamentals, last_close);
        let metrics = DerivedMetrics::compute(&history, current_price);

        debug!(ticker, bars = history.len(), current_price, "Market data normalized");

        Ok(NormalizedMarketData {
            snapshot: MarketSnapshot {
                ticker: ticker.to_string(),
                current_price,
                history,
                fundamentals,
                vix_level,
                headlines,
            },
            metrics,
        })
    }
}

/// Live quote when positive, else the most recent close
fn resolve_current_price(fundamentals: &RawFundamentals, last_close: f64) -> f64 {
    fundamentals
        .current_price
        .filter(|p| *p > 0.0)
        .unwrap_or(last_close)
}

/// Bring debt/equity to a plain ratio
///
/// Some sources report it in percentage points (150 meaning 1.5x). Values
/// whose magnitude exceeds 10 are treated that way.
pub fn normalize_debt_to_equity(raw: Option<f64>) -> Option<f64> {
    let value = raw.filter(|v| v.is_finite())?;
    if value.abs() > 10.0 {
        Some(round_to(value / 100.0, 2))
    } else {
        Some(round_to(value, 2))
    }
}

/// Reported PEG, else P/E divided by EPS growth in percent, else `fallback`
pub fn resolve_peg(
    reported: Option<f64>,
    trailing_pe: Option<f64>,
    eps_growth: Option<f64>,
    fallback: f64,
) -> f64 {
    if let Some(peg) = reported.filter(|v| v.is_finite()) {
        return peg;
    }

    let growth_pct = eps_growth
        .filter(|g| g.is_finite() && *g != 0.0)
        .map(|g| round_to(g * 100.0, 2))
        .filter(|g| *g != 0.0);

    match (trailing_pe.filter(|pe| pe.is_finite() && *pe != 0.0), growth_pct) {
        (Some(pe), Some(growth)) => round_to(pe / growth, 2),
        _ => fallback,
    }
}
