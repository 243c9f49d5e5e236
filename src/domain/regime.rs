//! Broad-market regime from index closes versus their simple moving average.

use crate::domain::ohlcv::PriceBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Bull,
    Neutral,
    Bear,
    Unknown,
}

impl Regime {
    pub fn note(self) -> &'static str {
        match self {
            Regime::Bull => "All indices above their moving average. New long positions permitted.",
            Regime::Neutral => "Mixed signals across indices. Be highly selective with new positions.",
            Regime::Bear => {
                "All indices below their moving average. No new long positions; bias toward reduce or exit."
            }
            Regime::Unknown => "No usable index data. Treat as neutral.",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Regime::Bull => "BULL",
            Regime::Neutral => "NEUTRAL",
            Regime::Bear => "BEAR",
            Regime::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReading {
    pub ticker: String,
    pub close: f64,
    pub moving_average: f64,
    pub above_ma: bool,
    pub pct_from_ma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeReport {
    pub regime: Regime,
    pub note: String,
    pub ma_period: usize,
    pub indices: BTreeMap<String, IndexReading>,
}

/// Latest close against the mean of the last `ma_period` closes.
///
/// `None` when fewer than `ma_period` bars are available.
pub fn read_index(ticker: &str, bars: &[PriceBar], ma_period: usize) -> Option<IndexReading> {
    if ma_period == 0 || bars.len() < ma_period {
        return None;
    }
    let close = bars.last()?.close;
    let tail = &bars[bars.len() - ma_period..];
    let moving_average = tail.iter().map(|b| b.close).sum::<f64>() / ma_period as f64;

    Some(IndexReading {
        ticker: ticker.to_string(),
        close,
        moving_average,
        above_ma: close > moving_average,
        pct_from_ma: (close - moving_average) / moving_average,
    })
}

pub fn classify(indices: &[(String, Vec<PriceBar>)], ma_period: usize) -> RegimeReport {
    let mut readings = BTreeMap::new();
    for (ticker, bars) in indices {
        match read_index(ticker, bars, ma_period) {
            Some(reading) => {
                readings.insert(ticker.clone(), reading);
            }
            None => tracing::warn!(
                ticker = %ticker,
                bars = bars.len(),
                ma_period,
                "insufficient index history"
            ),
        }
    }

    let above = readings.values().filter(|r| r.above_ma).count();
    let regime = if readings.is_empty() {
        Regime::Unknown
    } else if above == readings.len() {
        Regime::Bull
    } else if above == 0 {
        Regime::Bear
    } else {
        Regime::Neutral
    };

    tracing::info!(%regime, indices = readings.len(), above, "market regime");

    RegimeReport {
        regime,
        note: regime.note().to_string(),
        ma_period,
        indices: readings,
    }
}
