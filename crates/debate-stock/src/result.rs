//! Final analysis payload

use crate::debate::{DebateRecord, SubScores, XaiRationale};
use crate::market::{Bar, FundamentalsView, TechnicalsView, round_to};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechnicalOutlook {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundamentalStrength {
    Strong,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationLabel {
    Premium,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

/// One-word labels summarizing each dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub technicals: TechnicalOutlook,
    pub fundamentals: FundamentalStrength,
    pub valuation: ValuationLabel,
    pub risk: RiskLevel,
}

/// Daily bar for display, dated `MM/DD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<&Bar> for ChartPoint {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.timestamp.format("%m/%d").to_string(),
            open: round_to(bar.open, 2),
            high: round_to(bar.high, 2),
            low: round_to(bar.low, 2),
            close: round_to(bar.close, 2),
            volume: bar.volume,
        }
    }
}

/// Adjudicator output plus the debate that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub xai_rationale: XaiRationale,
    pub sub_scores: SubScores,
    pub debate: DebateRecord,
}

/// Everything a client needs to render an analysis
///
/// Written once to the cache and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub name: String,
    pub score: u8,
    /// Classification, upper-cased
    pub recommendation: String,
    /// Expected 1-6 month trend
    pub summary: String,
    pub price: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
    pub market_cap: u64,
    pub breakdown: Breakdown,
    pub metrics: FundamentalsView,
    pub technicals: TechnicalsView,
    pub ai_analysis: AiAnalysis,
    #[serde(rename = "chartData")]
    pub chart_data: Vec<ChartPoint>,
}
