//! Raw market data as returned by a provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Company fields as reported by the data provider
///
/// Every field is optional; providers routinely omit or null them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFundamentals {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub sector: Option<String>,
    /// Live quote
    pub current_price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Fraction, 0.25 means 25%
    pub return_on_equity: Option<f64>,
    /// Either a ratio or percentage points depending on the source
    pub debt_to_equity: Option<f64>,
    pub free_cashflow: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    /// Fraction, 0.10 means 10%
    pub earnings_quarterly_growth: Option<f64>,
    /// Fraction, 0.012 means 1.2%
    pub regular_market_change_percent: Option<f64>,
}

impl RawFundamentals {
    /// Replace NaN and infinite numbers with `None`
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.current_price,
            &mut self.trailing_pe,
            &mut self.peg_ratio,
            &mut self.price_to_book,
            &mut self.return_on_equity,
            &mut self.debt_to_equity,
            &mut self.free_cashflow,
            &mut self.market_cap,
            &mut self.beta,
            &mut self.earnings_quarterly_growth,
            &mut self.regular_market_change_percent,
        ] {
            *field = field.filter(|v| v.is_finite());
        }
        self
    }

    /// Display name: short name, then long name, then the ticker itself
    pub fn display_name(&self, ticker: &str) -> String {
        self.short_name
            .as_deref()
            .or(self.long_name.as_deref())
            .unwrap_or(ticker)
            .to_string()
    }
}

/// Everything fetched for one ticker, created once per request
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    /// Upper-cased symbol
    pub ticker: String,
    /// Live quote when available, else the last close
    pub current_price: f64,
    /// Daily bars, oldest first, never empty
    pub history: Vec<Bar>,
    pub fundamentals: RawFundamentals,
    pub vix_level: f64,
    pub headlines: Vec<String>,
}

impl MarketSnapshot {
    /// Closing prices, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.history.iter().map(|b| b.close).collect()
    }

    /// Sector, defaulting to "Unknown"
    pub fn sector(&self) -> &str {
        self.fundamentals.sector.as_deref().unwrap_or("Unknown")
    }
}
