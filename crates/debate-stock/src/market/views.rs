//! Read-only projections of the market data, one per agent role
//!
//! Serialized key names are part of the prompt contract and of the final
//! result payload, so they are spelled out field by field.

use super::{MacdCrossover, NormalizedMarketData, VolumeMomentum, normalize_debt_to_equity, resolve_peg, round_to};
use crate::config::DebateConfig;
use serde::{Deserialize, Serialize};

/// Valuation, profitability and growth figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsView {
    #[serde(rename = "P_E_Ratio")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "Sector_P_E_Median")]
    pub sector_pe_median: f64,
    #[serde(rename = "P_B_Ratio")]
    pub pb_ratio: Option<f64>,
    #[serde(rename = "PEG_Ratio")]
    pub peg_ratio: f64,
    #[serde(rename = "ROE_pct")]
    pub roe_pct: Option<f64>,
    #[serde(rename = "Debt_to_Equity")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "Free_Cash_Flow_Yield_pct")]
    pub fcf_yield_pct: Option<f64>,
    #[serde(rename = "5Y_EPS_Growth_Rate_pct")]
    pub eps_growth_pct: Option<f64>,
    #[serde(rename = "Recent_EPS_Revision_Trend")]
    pub eps_revision_trend: String,
}

/// Price action indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalsView {
    #[serde(rename = "Current_Price")]
    pub current_price: f64,
    #[serde(rename = "SMA_50")]
    pub sma_50: Option<f64>,
    #[serde(rename = "SMA_200")]
    pub sma_200: Option<f64>,
    #[serde(rename = "RSI_14")]
    pub rsi_14: Option<f64>,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: MacdCrossover,
    #[serde(rename = "Williams_R")]
    pub williams_r: Option<f64>,
    #[serde(rename = "Volume_Momentum")]
    pub volume_momentum: VolumeMomentum,
}

/// News and social sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentView {
    /// 0.5 when headlines exist, 0.1 otherwise
    #[serde(rename = "FinBERT_News_Score_Approx")]
    pub news_score: f64,
    #[serde(rename = "Recent_Headlines")]
    pub headlines: Vec<String>,
    #[serde(rename = "Overnight_Social_Sentiment")]
    pub social_sentiment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationVsSector {
    #[serde(rename = "P_E_Ratio")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "Sector_P_E_Median")]
    pub sector_pe_median: f64,
    #[serde(rename = "P_E_Premium_pct")]
    pub pe_premium_pct: Option<f64>,
}

/// Macro regime and stock-level risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRiskView {
    #[serde(rename = "VIX_Level")]
    pub vix_level: f64,
    #[serde(rename = "Federal_Funds_Rate_Trend")]
    pub fed_funds_trend: String,
    #[serde(rename = "US_GDP_Expectation_pct")]
    pub gdp_expectation_pct: f64,
    #[serde(rename = "Stock_Beta")]
    pub beta: f64,
    #[serde(rename = "Valuation_vs_Sector")]
    pub valuation_vs_sector: ValuationVsSector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsValuation {
    #[serde(rename = "P_E_Ratio")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "P_B_Ratio")]
    pub pb_ratio: Option<f64>,
    #[serde(rename = "PEG_Ratio")]
    pub peg_ratio: f64,
    #[serde(rename = "Debt_to_Equity")]
    pub debt_to_equity: Option<f64>,
}

/// Bear input: macro/risk plus the valuation multiples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearView {
    #[serde(flatten)]
    pub macro_risk: MacroRiskView,
    #[serde(rename = "Fundamentals_Valuation")]
    pub fundamentals_valuation: FundamentalsValuation,
}

/// Quant input: technicals and sentiment side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantView {
    #[serde(flatten)]
    pub technicals: TechnicalsView,
    #[serde(flatten)]
    pub sentiment: SentimentView,
}

/// Everything, for the adjudicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullPayload {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Fundamentals")]
    pub fundamentals: FundamentalsView,
    #[serde(rename = "Technicals")]
    pub technicals: TechnicalsView,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentView,
    #[serde(rename = "Macro_and_Risk")]
    pub macro_risk: MacroRiskView,
}

/// All views for one ticker
#[derive(Debug, Clone, PartialEq)]
pub struct AgentViews {
    pub ticker: String,
    pub sector: String,
    pub fundamentals: FundamentalsView,
    pub technicals: TechnicalsView,
    pub sentiment: SentimentView,
    pub macro_risk: MacroRiskView,
}

impl AgentViews {
    /// Project normalized data into views
    pub fn build(data: &NormalizedMarketData, config: &DebateConfig) -> Self {
        let snapshot = &data.snapshot;
        let raw = &snapshot.fundamentals;
        let assumptions = &config.macro_assumptions;
        let median = assumptions.sector_pe_median;

        let pe_ratio = raw.trailing_pe;
        let nonzero = |v: &f64| *v != 0.0;

        let fundamentals = FundamentalsView {
            pe_ratio,
            sector_pe_median: median,
            pb_ratio: raw.price_to_book,
            peg_ratio: resolve_peg(
                raw.peg_ratio,
                raw.trailing_pe,
                raw.earnings_quarterly_growth,
                config.peg_fallback,
            ),
            roe_pct: raw
                .return_on_equity
                .filter(nonzero)
                .map(|roe| round_to(roe * 100.0, 2)),
            debt_to_equity: normalize_debt_to_equity(raw.debt_to_equity),
            fcf_yield_pct: match (raw.free_cashflow.filter(nonzero), raw.market_cap.filter(nonzero)) {
                (Some(fcf), Some(cap)) => Some(round_to(fcf / cap * 100.0, 2)),
                _ => None,
            },
            eps_growth_pct: raw
                .earnings_quarterly_growth
                .filter(nonzero)
                .map(|g| round_to(g * 100.0, 2)),
            eps_revision_trend: "Neutral".to_string(),
        };

        let metrics = &data.metrics;
        let technicals = TechnicalsView {
            current_price: round_to(snapshot.current_price, 2),
            sma_50: metrics.sma_50,
            sma_200: metrics.sma_200,
            rsi_14: metrics.rsi_14,
            macd_signal: metrics.macd_crossover(),
            williams_r: metrics.williams_r,
            volume_momentum: metrics.volume_momentum,
        };

        let sentiment = SentimentView {
            news_score: if snapshot.headlines.is_empty() { 0.1 } else { 0.5 },
            headlines: snapshot.headlines.clone(),
            social_sentiment: "Neutral".to_string(),
        };

        let macro_risk = MacroRiskView {
            vix_level: snapshot.vix_level,
            fed_funds_trend: assumptions.fed_funds_trend.clone(),
            gdp_expectation_pct: assumptions.gdp_expectation_pct,
            beta: raw.beta.unwrap_or(1.0),
            valuation_vs_sector: ValuationVsSector {
                pe_ratio,
                sector_pe_median: median,
                pe_premium_pct: pe_ratio
                    .filter(nonzero)
                    .filter(|_| median != 0.0)
                    .map(|pe| round_to((pe - median) / median * 100.0, 1)),
            },
        };

        Self {
            ticker: snapshot.ticker.clone(),
            sector: snapshot.sector().to_string(),
            fundamentals,
            technicals,
            sentiment,
            macro_risk,
        }
    }

    /// Bull input
    pub fn bull_view(&self) -> &FundamentalsView {
        &self.fundamentals
    }

    /// Bear input
    pub fn bear_view(&self) -> BearView {
        BearView {
            macro_risk: self.macro_risk.clone(),
            fundamentals_valuation: FundamentalsValuation {
                pe_ratio: self.fundamentals.pe_ratio,
                pb_ratio: self.fundamentals.pb_ratio,
                peg_ratio: self.fundamentals.peg_ratio,
                debt_to_equity: self.fundamentals.debt_to_equity,
            },
        }
    }

    /// Quant input
    pub fn quant_view(&self) -> QuantView {
        QuantView {
            technicals: self.technicals.clone(),
            sentiment: self.sentiment.clone(),
        }
    }

    /// Adjudicator input
    pub fn full_payload(&self) -> FullPayload {
        FullPayload {
            ticker: self.ticker.clone(),
            sector: self.sector.clone(),
            fundamentals: self.fundamentals.clone(),
            technicals: self.technicals.clone(),
            sentiment: self.sentiment.clone(),
            macro_risk: self.macro_risk.clone(),
        }
    }
}
