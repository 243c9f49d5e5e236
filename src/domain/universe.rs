//! Trading universe and the per-ticker trend report.
//!
//! The universe is the watchlist plus every held ticker. Each ticker is its
//! own failure domain: a fetch error or short history becomes a skip entry
//! and never blocks the rest of the report.

use crate::domain::breakout::{self, SignalOutcome, SkipReason};
use crate::domain::config::SignalConfig;
use crate::domain::position::Position;
use crate::ports::data_port::PriceDataPort;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Parse a comma separated ticker list, upper-casing each symbol.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// Union of the watchlist and held tickers, sorted.
pub fn build_universe(
    watchlist: &BTreeSet<String>,
    positions: &BTreeMap<String, Position>,
) -> Vec<String> {
    watchlist
        .iter()
        .chain(positions.keys())
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub asof_date: NaiveDate,
    pub window: usize,
    pub universe: Vec<String>,
    pub signals: BTreeMap<String, SignalOutcome>,
}

impl TrendReport {
    pub fn signal_count(&self) -> usize {
        self.signals.values().filter(|o| !o.is_skipped()).count()
    }

    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.signals
            .iter()
            .filter_map(|(ticker, outcome)| match outcome {
                SignalOutcome::Skipped(reason) => Some((ticker.as_str(), reason)),
                SignalOutcome::Signal(_) => None,
            })
            .collect()
    }
}

/// Compute one outcome per universe ticker.
pub fn generate_trend_report(
    data_port: &dyn PriceDataPort,
    universe: &[String],
    positions: &BTreeMap<String, Position>,
    config: &SignalConfig,
    now: DateTime<Utc>,
) -> TrendReport {
    tracing::info!(tickers = universe.len(), window = config.window, "generating trend signals");

    let mut signals = BTreeMap::new();
    for ticker in universe {
        let outcome = match data_port.fetch_bars(ticker) {
            Ok(bars) => breakout::compute(
                ticker,
                &bars,
                positions.get(ticker),
                config.window,
                config.hard_stop_pct,
            ),
            Err(e) => SignalOutcome::Skipped(SkipReason::FetchFailed {
                message: e.to_string(),
            }),
        };

        match &outcome {
            SignalOutcome::Signal(s) => tracing::info!(
                ticker = %ticker,
                close = s.close,
                breakout = s.breakout,
                breakdown = s.breakdown,
                "signal"
            ),
            SignalOutcome::Skipped(reason) => {
                tracing::warn!(ticker = %ticker, %reason, "skipping ticker")
            }
        }
        signals.insert(ticker.clone(), outcome);
    }

    TrendReport {
        generated_at: now,
        asof_date: now.date_naive(),
        window: config.window,
        universe: universe.to_vec(),
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(ticker: &str) -> Position {
        Position {
            ticker: ticker.into(),
            shares: 1,
            avg_cost: 10.0,
            override_stop_price: None,
        }
    }

    #[test]
    fn test_parse_tickers_basic() {
        let result = parse_tickers("NVDA,META,AMD").unwrap();
        assert_eq!(result, vec!["NVDA", "META", "AMD"]);
    }

    #[test]
    fn test_parse_tickers_with_whitespace_and_case() {
        let result = parse_tickers("  nvda , Meta ,amd").unwrap();
        assert_eq!(result, vec!["NVDA", "META", "AMD"]);
    }

    #[test]
    fn test_parse_tickers_empty_token() {
        let result = parse_tickers("NVDA,,AMD");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_tickers_duplicate() {
        let result = parse_tickers("NVDA,AMD,nvda");
        assert!(matches!(result, Err(UniverseError::DuplicateTicker(s)) if s == "NVDA"));
    }

    #[test]
    fn test_universe_is_union() {
        let watchlist: BTreeSet<String> = ["NVDA", "MU"].iter().map(|s| s.to_string()).collect();
        let positions: BTreeMap<String, Position> = [("MU", position("MU")), ("AAPL", position("AAPL"))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(build_universe(&watchlist, &positions), vec!["AAPL", "MU", "NVDA"]);
    }

    #[test]
    fn test_universe_empty() {
        assert!(build_universe(&BTreeSet::new(), &BTreeMap::new()).is_empty());
    }
}
