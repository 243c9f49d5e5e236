//! Held positions and their price-relative annotations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HARD_STOP_PCT: f64 = 0.12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    #[serde(default)]
    pub shares: u64,
    pub avg_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_stop_price: Option<f64>,
}

/// Risk context attached to a trend signal when the ticker is held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAnnotation {
    pub shares: u64,
    pub avg_cost: f64,
    pub unrealized_pnl_pct: f64,
    pub hard_stop_price: f64,
    pub distance_to_hard_stop_pct: f64,
}

impl Position {
    pub fn hard_stop_price(&self, hard_stop_pct: f64) -> f64 {
        self.avg_cost * (1.0 - hard_stop_pct)
    }

    pub fn unrealized_pnl_pct(&self, price: f64) -> f64 {
        (price - self.avg_cost) / self.avg_cost
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// `None` when the cost basis is unusable or the close is not positive.
    pub fn annotate(&self, close: f64, hard_stop_pct: f64) -> Option<PositionAnnotation> {
        if self.avg_cost <= 0.0 || close <= 0.0 {
            return None;
        }
        let hard_stop_price = self.hard_stop_price(hard_stop_pct);
        Some(PositionAnnotation {
            shares: self.shares,
            avg_cost: self.avg_cost,
            unrealized_pnl_pct: self.unrealized_pnl_pct(close),
            hard_stop_price,
            distance_to_hard_stop_pct: (close - hard_stop_price) / close,
        })
    }
}

/// Index positions by upper-cased ticker. Later duplicates replace earlier ones.
pub fn index_positions(positions: Vec<Position>) -> BTreeMap<String, Position> {
    positions
        .into_iter()
        .filter(|p| !p.ticker.trim().is_empty())
        .map(|p| (p.ticker.trim().to_uppercase(), p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_position() -> Position {
        Position {
            ticker: "NVDA".into(),
            shares: 10,
            avg_cost: 100.0,
            override_stop_price: None,
        }
    }

    #[test]
    fn hard_stop_is_twelve_percent_below_cost() {
        assert_relative_eq!(sample_position().hard_stop_price(DEFAULT_HARD_STOP_PCT), 88.0);
    }

    #[test]
    fn annotate_profit() {
        let a = sample_position().annotate(110.0, DEFAULT_HARD_STOP_PCT).unwrap();
        assert_eq!(a.shares, 10);
        assert_relative_eq!(a.unrealized_pnl_pct, 0.10);
        assert_relative_eq!(a.hard_stop_price, 88.0);
        assert_relative_eq!(a.distance_to_hard_stop_pct, 22.0 / 110.0);
    }

    #[test]
    fn annotate_below_stop_goes_negative() {
        let a = sample_position().annotate(80.0, DEFAULT_HARD_STOP_PCT).unwrap();
        assert!(a.unrealized_pnl_pct < 0.0);
        assert!(a.distance_to_hard_stop_pct < 0.0);
    }

    #[test]
    fn annotate_rejects_zero_cost() {
        let mut pos = sample_position();
        pos.avg_cost = 0.0;
        assert!(pos.annotate(110.0, DEFAULT_HARD_STOP_PCT).is_none());
    }

    #[test]
    fn market_value() {
        assert_relative_eq!(sample_position().market_value(55.0), 550.0);
    }

    #[test]
    fn index_uppercases_tickers() {
        let mut lower = sample_position();
        lower.ticker = " mu ".into();
        let idx = index_positions(vec![sample_position(), lower]);
        assert_eq!(idx.keys().cloned().collect::<Vec<_>>(), vec!["MU", "NVDA"]);
    }
}
