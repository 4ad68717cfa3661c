//! Merge the verdict with locally computed fields

use crate::debate::{DebateRecord, Verdict};
use crate::market::{AgentViews, NormalizedMarketData, round_to};
use crate::result::{
    AiAnalysis, AnalysisResult, Breakdown, ChartPoint, FundamentalStrength, RiskLevel,
    TechnicalOutlook, ValuationLabel,
};

/// Provider change values above this magnitude (in percent) are treated as bogus
const CHANGE_PERCENT_SANITY_LIMIT: f64 = 25.0;

const RSI_BULLISH_ABOVE: f64 = 50.0;
const FUNDAMENTAL_STRONG_ABOVE: u8 = 60;
const PE_PREMIUM_ABOVE: f64 = 25.0;
const BETA_HIGH_ABOVE: f64 = 1.2;
const VIX_HIGH_ABOVE: f64 = 20.0;

/// Daily change in percent
///
/// Uses the provider's fraction when present and plausible, else the last
/// two closes, else 0.
pub fn change_percent(provider_fraction: Option<f64>, closes: &[f64]) -> f64 {
    let from_provider = provider_fraction
        .filter(|f| f.is_finite())
        .map(|f| f * 100.0)
        .filter(|pct| pct.abs() <= CHANGE_PERCENT_SANITY_LIMIT);

    let value = from_provider.unwrap_or_else(|| change_from_closes(closes));
    if value.is_finite() { round_to(value, 2) } else { 0.0 }
}

fn change_from_closes(closes: &[f64]) -> f64 {
    match closes {
        [.., prev, last] if *prev != 0.0 => (last - prev) / prev * 100.0,
        _ => 0.0,
    }
}

/// One-word labels for each dimension
pub fn breakdown(views: &AgentViews, verdict: &Verdict) -> Breakdown {
    let rsi = views.technicals.rsi_14.unwrap_or(50.0);
    let pe = views.fundamentals.pe_ratio.unwrap_or(0.0);
    let beta = views.macro_risk.beta;
    let vix = views.macro_risk.vix_level;

    Breakdown {
        technicals: if rsi > RSI_BULLISH_ABOVE {
            TechnicalOutlook::Bullish
        } else {
            TechnicalOutlook::Bearish
        },
        fundamentals: if verdict.sub_scores.fundamental > FUNDAMENTAL_STRONG_ABOVE {
            FundamentalStrength::Strong
        } else {
            FundamentalStrength::Mixed
        },
        valuation: if pe > PE_PREMIUM_ABOVE {
            ValuationLabel::Premium
        } else {
            ValuationLabel::Value
        },
        risk: if beta > BETA_HIGH_ABOVE || vix > VIX_HIGH_ABOVE {
            RiskLevel::High
        } else {
            RiskLevel::Low
        },
    }
}

/// Build the final payload
pub fn assemble(
    data: &NormalizedMarketData,
    views: &AgentViews,
    verdict: &Verdict,
    debate: DebateRecord,
    chart_bars: usize,
) -> AnalysisResult {
    let snapshot = &data.snapshot;
    let fundamentals = &snapshot.fundamentals;
    let history = &snapshot.history;

    let chart_data = history
        .iter()
        .skip(history.len().saturating_sub(chart_bars))
        .map(ChartPoint::from)
        .collect();

    AnalysisResult {
        ticker: snapshot.ticker.clone(),
        name: fundamentals.display_name(&snapshot.ticker),
        score: verdict.score,
        recommendation: verdict.classification.as_str().to_uppercase(),
        summary: verdict.expected_trend.clone(),
        price: snapshot.current_price,
        change_percent: change_percent(
            fundamentals.regular_market_change_percent,
            &snapshot.closes(),
        ),
        market_cap: market_cap(fundamentals.market_cap),
        breakdown: breakdown(views, verdict),
        metrics: views.fundamentals.clone(),
        technicals: views.technicals.clone(),
        ai_analysis: AiAnalysis {
            xai_rationale: verdict.rationale.clone(),
            sub_scores: verdict.sub_scores,
            debate,
        },
        chart_data,
    }
}

/// Whole-dollar market cap; missing or negative becomes 0
pub(crate) fn market_cap(raw: Option<f64>) -> u64 {
    raw.filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebateConfig;
    use crate::debate::{Classification, SubScores, XaiRationale};
    use crate::market::{Bar, DerivedMetrics, MarketSnapshot, RawFundamentals};
    use chrono::{TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_704_067_200 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 + i as u64,
            })
            .collect()
    }

    fn data(closes: &[f64], fundamentals: RawFundamentals, vix: f64) -> NormalizedMarketData {
        let history = bars(closes);
        let current_price = *closes.last().unwrap();
        NormalizedMarketData {
            metrics: DerivedMetrics::compute(&history, current_price),
            snapshot: MarketSnapshot {
                ticker: "ACME".to_string(),
                current_price,
                history,
                fundamentals,
                vix_level: vix,
                headlines: vec![],
            },
        }
    }

    fn verdict(fundamental: u8) -> Verdict {
        Verdict {
            ticker: "ACME".to_string(),
            score: 68,
            classification: Classification::StrongBuy,
            expected_trend: "Higher".to_string(),
            rationale: XaiRationale {
                positive_drivers: vec!["ROE".to_string()],
                negative_drivers: vec![],
            },
            sub_scores: SubScores {
                fundamental,
                technical: 50,
                sentiment: 50,
                macro_risk: 50,
            },
        }
    }

    fn debate() -> DebateRecord {
        DebateRecord {
            bull: "bull".to_string(),
            bear: "bear".to_string(),
            quant: "quant".to_string(),
        }
    }

    #[test]
    fn test_change_percent_implausible_provider_value() {
        // 0.40 is 40%, beyond the sanity limit
        assert_eq!(change_percent(Some(0.40), &[98.0, 100.0, 105.0]), 5.0);
    }

    #[test]
    fn test_change_percent_plausible_provider_value() {
        assert_eq!(change_percent(Some(0.012), &[100.0, 105.0]), 1.2);
    }

    #[test]
    fn test_change_percent_without_provider_value() {
        assert_eq!(change_percent(None, &[200.0, 190.0]), -5.0);
        assert_eq!(change_percent(None, &[100.0]), 0.0);
        assert_eq!(change_percent(None, &[]), 0.0);
        assert_eq!(change_percent(Some(f64::NAN), &[0.0, 5.0]), 0.0);
    }

    #[test]
    fn test_breakdown_labels() {
        let raw = RawFundamentals {
            trailing_pe: Some(30.0),
            beta: Some(0.9),
            ..Default::default()
        };
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        let d = data(&closes, raw, 15.0);
        let views = AgentViews::build(&d, &DebateConfig::default());

        let labels = breakdown(&views, &verdict(61));
        assert_eq!(labels.technicals, TechnicalOutlook::Bullish);
        assert_eq!(labels.fundamentals, FundamentalStrength::Strong);
        assert_eq!(labels.valuation, ValuationLabel::Premium);
        assert_eq!(labels.risk, RiskLevel::Low);

        let labels = breakdown(&views, &verdict(60));
        assert_eq!(labels.fundamentals, FundamentalStrength::Mixed);
    }

    #[test]
    fn test_breakdown_unknowns() {
        let d = data(&[10.0, 10.5], RawFundamentals::default(), 21.0);
        let views = AgentViews::build(&d, &DebateConfig::default());

        let labels = breakdown(&views, &verdict(50));
        // RSI unknown counts as 50, which is not above 50
        assert_eq!(labels.technicals, TechnicalOutlook::Bearish);
        assert_eq!(labels.valuation, ValuationLabel::Value);
        assert_eq!(labels.risk, RiskLevel::High);
    }

    #[test]
    fn test_assemble() {
        let raw = RawFundamentals {
            short_name: Some("Acme Corp".to_string()),
            market_cap: Some(2.5e9),
            regular_market_change_percent: Some(0.40),
            ..Default::default()
        };
        let mut closes: Vec<f64> = vec![90.0; 38];
        closes.extend([100.0, 105.0]);
        let d = data(&closes, raw, 15.0);
        let views = AgentViews::build(&d, &DebateConfig::default());

        let result = assemble(&d, &views, &verdict(70), debate(), 30);
        assert_eq!(result.ticker, "ACME");
        assert_eq!(result.name, "Acme Corp");
        assert_eq!(result.recommendation, "STRONG BUY");
        assert_eq!(result.summary, "Higher");
        assert_eq!(result.change_percent, 5.0);
        assert_eq!(result.market_cap, 2_500_000_000);
        assert_eq!(result.chart_data.len(), 30);
        assert_eq!(result.chart_data.last().unwrap().close, 105.0);
        assert_eq!(result.ai_analysis.debate.quant, "quant");
        assert_eq!(result.price, 105.0);
    }

    #[test]
    fn test_assemble_short_history_chart() {
        let d = data(&[1.0, 2.0, 3.0], RawFundamentals::default(), 15.0);
        let views = AgentViews::build(&d, &DebateConfig::default());
        let result = assemble(&d, &views, &verdict(50), debate(), 30);
        assert_eq!(result.chart_data.len(), 3);
        assert_eq!(result.name, "ACME");
        assert_eq!(result.market_cap, 0);
    }

    #[test]
    fn test_market_cap() {
        assert_eq!(market_cap(None), 0);
        assert_eq!(market_cap(Some(-1.0)), 0);
        assert_eq!(market_cap(Some(1_234.6)), 1_235);
    }
}
