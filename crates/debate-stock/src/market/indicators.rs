//! Technical indicators derived from daily bars
//!
//! Every indicator returns `None` when the history is too short to define
//! it. NaN never escapes this module.

use super::{round_to, snapshot::Bar};
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};

const RSI_PERIOD: usize = 14;
const WILLIAMS_PERIOD: usize = 14;
const VOLUME_PERIOD: usize = 20;

/// Latest volume relative to its 20-day average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeMomentum {
    Expanding,
    Contracting,
}

/// Direction of MACD against its signal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdCrossover {
    #[serde(rename = "Bullish Crossover")]
    Bullish,
    #[serde(rename = "Bearish Crossover")]
    Bearish,
}

/// Indicators computed from the history, rounded to 2 decimals
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub williams_r: Option<f64>,
    pub volume_avg_20: Option<f64>,
    pub volume_momentum: VolumeMomentum,
}

impl DerivedMetrics {
    /// Compute all indicators; `current_price` anchors Williams %R
    pub fn compute(history: &[Bar], current_price: f64) -> Self {
        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        let (macd, macd_signal) = macd(&closes).unzip();
        let volume_avg_20 = volume_average(history, VOLUME_PERIOD);

        Self {
            sma_50: sma(&closes, 50).map(|v| round_to(v, 2)),
            sma_200: sma(&closes, 200).map(|v| round_to(v, 2)),
            rsi_14: wilder_rsi(&closes, RSI_PERIOD).map(|v| round_to(v, 2)),
            macd,
            macd_signal,
            williams_r: williams_r(history, current_price, WILLIAMS_PERIOD)
                .map(|v| round_to(v, 2)),
            volume_avg_20,
            volume_momentum: volume_momentum(history, volume_avg_20),
        }
    }

    /// MACD direction; bearish unless MACD is strictly above its signal
    pub fn macd_crossover(&self) -> MacdCrossover {
        match (self.macd, self.macd_signal) {
            (Some(m), Some(s)) if m > s => MacdCrossover::Bullish,
            _ => MacdCrossover::Bearish,
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Simple moving average of the last `period` closes
pub fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let mut indicator = SimpleMovingAverage::new(period).ok()?;
    let mut last = f64::NAN;
    for &close in &closes[closes.len() - period..] {
        last = indicator.next(close);
    }
    finite(last)
}

/// RSI with Wilder smoothing
///
/// Seeded with the simple mean of the first `period` gains and losses, then
/// smoothed as `(prev * (period - 1) + current) / period`.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = deltas.split_at(period);
    let n = period as f64;

    let mut avg_gain = seed.iter().map(|d| d.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = seed.iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;

    for d in rest {
        avg_gain = (avg_gain * (n - 1.0) + d.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-d).max(0.0)) / n;
    }

    if avg_loss <= 0.0 {
        // flat series has no defined RSI
        return (avg_gain > 0.0).then_some(100.0);
    }
    finite(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

/// MACD line (EMA12 - EMA26) and its EMA9 signal, latest values
pub fn macd(closes: &[f64]) -> Option<(f64, f64)> {
    if closes.is_empty() {
        return None;
    }
    let mut ema12 = ExponentialMovingAverage::new(12).ok()?;
    let mut ema26 = ExponentialMovingAverage::new(26).ok()?;
    let mut signal = ExponentialMovingAverage::new(9).ok()?;

    let mut line = f64::NAN;
    let mut sig = f64::NAN;
    for &close in closes {
        line = ema12.next(close) - ema26.next(close);
        sig = signal.next(line);
    }
    Some((finite(line)?, finite(sig)?))
}

/// Williams %R over the trailing window, `None` when the range is flat
pub fn williams_r(history: &[Bar], current_price: f64, period: usize) -> Option<f64> {
    if period == 0 || history.len() < period {
        return None;
    }
    let window = &history[history.len() - period..];
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

    let range = high - low;
    if range <= 0.0 || !range.is_finite() {
        return None;
    }
    finite((high - current_price) / range * -100.0)
}

/// Mean volume of the last `period` bars
pub fn volume_average(history: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period {
        return None;
    }
    let total: f64 = history[history.len() - period..]
        .iter()
        .map(|b| b.volume as f64)
        .sum();
    finite(total / period as f64)
}

fn volume_momentum(history: &[Bar], average: Option<f64>) -> VolumeMomentum {
    match (history.last(), average) {
        (Some(bar), Some(avg)) if bar.volume as f64 > avg => VolumeMomentum::Expanding,
        _ => VolumeMomentum::Contracting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_sma_requires_full_window() {
        let closes: Vec<f64> = (1..=49).map(f64::from).collect();
        assert_eq!(sma(&closes, 50), None);

        let closes: Vec<f64> = (1..=50).map(f64::from).collect();
        assert_eq!(sma(&closes, 50), Some(25.5));
    }

    #[test]
    fn test_sma_uses_trailing_window() {
        let closes = [1.0, 2.0, 3.0, 10.0, 20.0];
        assert_eq!(sma(&closes, 2), Some(15.0));
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<f64> = (0..20).map(f64::from).collect();
        assert_eq!(wilder_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_flat_is_unknown() {
        let closes = vec![10.0; 30];
        assert_eq!(wilder_rsi(&closes, 14), None);
    }

    #[test]
    fn test_rsi_too_short() {
        let closes: Vec<f64> = (0..14).map(f64::from).collect();
        assert_eq!(wilder_rsi(&closes, 14), None);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // alternating +1 / -1 keeps average gain equal to average loss
        let closes: Vec<f64> = (0..29).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!((rsi - 50.0).abs() < 5.0, "rsi was {rsi}");
    }

    #[test]
    fn test_macd_rising_series_is_bullish() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i)).collect();
        let history = bars(&closes);
        let metrics = DerivedMetrics::compute(&history, 159.0);
        assert_eq!(metrics.macd_crossover(), MacdCrossover::Bullish);
    }

    #[test]
    fn test_williams_r_flat_range_is_unknown() {
        let history: Vec<Bar> = bars(&[50.0; 20])
            .into_iter()
            .map(|mut b| {
                b.high = 50.0;
                b.low = 50.0;
                b
            })
            .collect();
        assert_eq!(williams_r(&history, 50.0, 14), None);
    }

    #[test]
    fn test_williams_r_value() {
        let closes: Vec<f64> = (6..=20).map(f64::from).collect();
        let history = bars(&closes);
        let value = williams_r(&history, 20.0, 14).unwrap();
        // high = 21, low = 6, (21 - 20) / 15 * -100
        assert!((value - (-6.666_666)).abs() < 1e-3);
    }

    #[test]
    fn test_volume_momentum() {
        let mut history = bars(&[10.0; 25]);
        let metrics = DerivedMetrics::compute(&history, 10.0);
        assert_eq!(metrics.volume_momentum, VolumeMomentum::Contracting);

        if let Some(last) = history.last_mut() {
            last.volume = 5_000;
        }
        let metrics = DerivedMetrics::compute(&history, 10.0);
        assert_eq!(metrics.volume_momentum, VolumeMomentum::Expanding);
    }

    #[test]
    fn test_short_history_yields_unknowns() {
        let history = bars(&[10.0, 11.0, 12.0]);
        let metrics = DerivedMetrics::compute(&history, 12.0);
        assert_eq!(metrics.sma_50, None);
        assert_eq!(metrics.sma_200, None);
        assert_eq!(metrics.rsi_14, None);
        assert_eq!(metrics.williams_r, None);
        assert_eq!(metrics.volume_avg_20, None);
        assert!(metrics.macd.is_some());
    }
}
