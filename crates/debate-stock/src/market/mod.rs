//! Market data normalization
//!
//! Turns whatever the provider returns into a [`MarketSnapshot`] with
//! [`DerivedMetrics`], then projects it into the per-agent views.

pub mod indicators;
pub mod normalizer;
pub mod snapshot;
pub mod views;

pub use indicators::{DerivedMetrics, MacdCrossover, VolumeMomentum};
pub use normalizer::{MarketDataNormalizer, NormalizedMarketData, normalize_debt_to_equity, resolve_peg};
pub use snapshot::{Bar, MarketSnapshot, RawFundamentals};
pub use views::{
    AgentViews, BearView, FullPayload, FundamentalsValuation, FundamentalsView, MacroRiskView,
    QuantView, SentimentView, TechnicalsView, ValuationVsSector,
};

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
