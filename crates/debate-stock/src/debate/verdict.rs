//! Adjudicator verdict and its structural validation

use crate::error::{DebateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much raw output to quote in parse errors
const RAW_EXCERPT_CHARS: usize = 300;

/// Final rating, ordered from most bearish to most bullish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Classification {
    /// Display form, e.g. "Strong Buy"
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongSell => "Strong Sell",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
            Self::Buy => "Buy",
            Self::StrongBuy => "Strong Buy",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "strongsell" => Ok(Self::StrongSell),
            "sell" => Ok(Self::Sell),
            "hold" => Ok(Self::Hold),
            "buy" => Ok(Self::Buy),
            "strongbuy" => Ok(Self::StrongBuy),
            _ => Err(DebateError::InvalidVerdictFormat(format!(
                "unknown classification '{s}'"
            ))),
        }
    }
}

impl Serialize for Classification {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Explainability drivers cited by the adjudicator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XaiRationale {
    #[serde(rename = "Top_Positive_Drivers", default)]
    pub positive_drivers: Vec<String>,
    #[serde(rename = "Top_Negative_Drivers", default)]
    pub negative_drivers: Vec<String>,
}

/// Per-dimension scores, each 0 to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    #[serde(rename = "Fundamental")]
    pub fundamental: u8,
    #[serde(rename = "Technical")]
    pub technical: u8,
    #[serde(rename = "Sentiment")]
    pub sentiment: u8,
    #[serde(rename = "Macro_Risk")]
    pub macro_risk: u8,
}

/// Structured output of the adjudicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ticker: String,
    pub score: u8,
    pub classification: Classification,
    pub expected_trend: String,
    pub rationale: XaiRationale,
    pub sub_scores: SubScores,
}

#[derive(Deserialize)]
struct WireVerdict {
    #[serde(rename = "Ticker", default)]
    ticker: Option<String>,
    #[serde(rename = "Recommendation_Score", default)]
    score: Option<f64>,
    #[serde(rename = "Classification", default)]
    classification: Option<String>,
    #[serde(rename = "Expected_Trend_1_to_6_Months", default)]
    expected_trend: Option<String>,
    #[serde(rename = "XAI_Rationale", default)]
    rationale: Option<XaiRationale>,
    #[serde(rename = "Sub_Scores", default)]
    sub_scores: Option<WireSubScores>,
}

#[derive(Deserialize)]
struct WireSubScores {
    #[serde(rename = "Fundamental", default)]
    fundamental: Option<f64>,
    #[serde(rename = "Technical", default)]
    technical: Option<f64>,
    #[serde(rename = "Sentiment", default)]
    sentiment: Option<f64>,
    #[serde(rename = "Macro_Risk", default)]
    macro_risk: Option<f64>,
}

impl Verdict {
    /// Parse the adjudicator's raw text
    ///
    /// Score, classification and all four sub-scores are required and must
    /// be whole numbers in 0..=100. Ticker, trend and rationale are optional; a missing
    /// ticker falls back to `requested_ticker`. One surrounding Markdown code
    /// fence is tolerated.
    pub fn parse(raw: &str, requested_ticker: &str) -> Result<Self> {
        let body = strip_code_fence(raw);
        let wire: WireVerdict = serde_json::from_str(body).map_err(|e| {
            DebateError::InvalidVerdictFormat(format!(
                "not a JSON verdict ({e}). Raw output: {}",
                excerpt(raw)
            ))
        })?;

        let score = required_score(wire.score, "Recommendation_Score")?;
        let classification = wire
            .classification
            .ok_or_else(|| missing("Classification"))?
            .parse()?;
        let sub = wire.sub_scores.ok_or_else(|| missing("Sub_Scores"))?;
        let sub_scores = SubScores {
            fundamental: required_score(sub.fundamental, "Sub_Scores.Fundamental")?,
            technical: required_score(sub.technical, "Sub_Scores.Technical")?,
            sentiment: required_score(sub.sentiment, "Sub_Scores.Sentiment")?,
            macro_risk: required_score(sub.macro_risk, "Sub_Scores.Macro_Risk")?,
        };

        Ok(Self {
            ticker: wire
                .ticker
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| requested_ticker.to_string()),
            score,
            classification,
            expected_trend: wire.expected_trend.unwrap_or_default(),
            rationale: wire.rationale.unwrap_or_default(),
            sub_scores,
        })
    }
}

fn missing(field: &str) -> DebateError {
    DebateError::InvalidVerdictFormat(format!("missing required field {field}"))
}

fn required_score(value: Option<f64>, field: &str) -> Result<u8> {
    let value = value.ok_or_else(|| missing(field))?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(DebateError::InvalidVerdictFormat(format!(
            "{field} out of range: {value}"
        )));
    }
    if value.fract() != 0.0 {
        return Err(DebateError::InvalidVerdictFormat(format!(
            "{field} must be a whole number: {value}"
        )));
    }
    Ok(value as u8)
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(RAW_EXCERPT_CHARS).collect()
}

/// Remove one surrounding ``` fence, with or without a language tag
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
