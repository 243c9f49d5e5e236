//! Rolling-window breakout signal engine.
//!
//! The window covers the `window` bars immediately before the latest bar;
//! the latest bar itself is never part of its own channel.

use crate::domain::ohlcv::{PriceBar, is_ascending};
use crate::domain::position::{Position, PositionAnnotation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub ticker: String,
    pub close: f64,
    pub window_high: f64,
    pub window_low: f64,
    pub breakout: bool,
    pub breakdown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientHistory { bars: usize, required: usize },
    UnorderedHistory,
    NoData,
    FetchFailed { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientHistory { bars, required } => {
                write!(f, "insufficient_history ({bars} bars, need {required})")
            }
            SkipReason::UnorderedHistory => write!(f, "unordered_history"),
            SkipReason::NoData => write!(f, "no_data"),
            SkipReason::FetchFailed { message } => write!(f, "fetch_failed ({message})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalOutcome {
    Signal(TrendSignal),
    Skipped(SkipReason),
}

impl SignalOutcome {
    pub fn signal(&self) -> Option<&TrendSignal> {
        match self {
            SignalOutcome::Signal(s) => Some(s),
            SignalOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SignalOutcome::Skipped(_))
    }
}

/// Compute the breakout signal for one ticker.
///
/// `price_history` must be ascending by date and hold at least
/// `window + 1` bars.
pub fn compute(
    ticker: &str,
    price_history: &[PriceBar],
    position: Option<&Position>,
    window: usize,
    hard_stop_pct: f64,
) -> SignalOutcome {
    if price_history.is_empty() {
        return SignalOutcome::Skipped(SkipReason::NoData);
    }
    let required = window + 1;
    if window == 0 || price_history.len() < required {
        return SignalOutcome::Skipped(SkipReason::InsufficientHistory {
            bars: price_history.len(),
            required,
        });
    }
    if !is_ascending(price_history) {
        return SignalOutcome::Skipped(SkipReason::UnorderedHistory);
    }

    let (today, history) = match price_history.split_last() {
        Some(split) => split,
        None => return SignalOutcome::Skipped(SkipReason::NoData),
    };
    let channel = &history[history.len() - window..];

    let window_high = channel
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let window_low = channel.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

    let close = today.close;
    let breakout = close > window_high;
    let breakdown = !breakout && close < window_low;

    SignalOutcome::Signal(TrendSignal {
        ticker: ticker.to_string(),
        close,
        window_high,
        window_low,
        breakout,
        breakdown,
        position: position.and_then(|p| p.annotate(close, hard_stop_pct)),
    })
}
