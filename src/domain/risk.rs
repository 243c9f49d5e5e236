//! Exit levels, triggered exit rules and portfolio heat for held positions.
//!
//! Exit rules apply in priority order: hard stop, ATR stop, trailing stop,
//! profit target, then the approaching-stop warning.

use crate::domain::ohlcv::PriceBar;
use crate::domain::position::{DEFAULT_HARD_STOP_PCT, Position};
use crate::ports::data_port::PriceDataPort;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROFIT_TARGET_PCT: f64 = 0.20;
pub const TRAILING_STOP_PCT: f64 = 0.08;
pub const TIME_STOP_DAYS: u32 = 20;
pub const ATR_MULTIPLIER: f64 = 2.0;
pub const ATR_PERIOD: usize = 14;
pub const MAX_PORTFOLIO_HEAT: f64 = 0.10;
pub const APPROACHING_STOP_PCT: f64 = 0.03;

/// Unrealized gain above which the hard stop rolls with the price.
const ROLLING_STOP_PNL: f64 = 1.0;

/// Exponentially smoothed true range, span `period`, seeded with the first
/// bar's high-low range.
pub fn atr(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let first = &bars[0];
    let mut smoothed = first.high - first.low;

    for pair in bars.windows(2) {
        let tr = pair[1].true_range(pair[0].close);
        smoothed = alpha * tr + (1.0 - alpha) * smoothed;
    }

    Some(smoothed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub hard_stop_price: f64,
    /// Signed distance of the hard stop from cost, e.g. -0.12.
    pub hard_stop_pct: f64,
    pub profit_target_price: f64,
    pub profit_target_pct: f64,
    pub trailing_stop_pct: f64,
    pub time_stop_days: u32,
    pub override_stop_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_stop_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_stop_pct: Option<f64>,
}

pub fn exit_levels(
    avg_cost: f64,
    atr: Option<f64>,
    override_stop: Option<f64>,
    current_price: Option<f64>,
) -> ExitLevels {
    let (hard_stop_price, hard_stop_pct) = match override_stop {
        Some(stop) => (stop, (stop - avg_cost) / avg_cost),
        None => (avg_cost * (1.0 - DEFAULT_HARD_STOP_PCT), -DEFAULT_HARD_STOP_PCT),
    };

    // with an override active the reference is the market price
    let atr_stop_price = atr.map(|a| {
        let reference = match (override_stop, current_price) {
            (Some(_), Some(price)) => price,
            _ => avg_cost,
        };
        reference - ATR_MULTIPLIER * a
    });

    ExitLevels {
        hard_stop_price,
        hard_stop_pct,
        profit_target_price: avg_cost * (1.0 + PROFIT_TARGET_PCT),
        profit_target_pct: PROFIT_TARGET_PCT,
        trailing_stop_pct: TRAILING_STOP_PCT,
        time_stop_days: TIME_STOP_DAYS,
        override_stop_active: override_stop.is_some(),
        atr_stop_pct: atr_stop_price.map(|p| (p - avg_cost) / avg_cost),
        atr_stop_price,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitRule {
    HardStop,
    AtrStop,
    TrailingStop,
    ProfitTarget,
    ApproachingHardStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredExit {
    pub rule: ExitRule,
    pub urgency: Urgency,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitEvaluation {
    pub any_triggered: bool,
    pub critical_exit: bool,
    pub high_urgency: bool,
    pub triggered_rules: Vec<TriggeredExit>,
}

impl ExitEvaluation {
    fn from_rules(triggered_rules: Vec<TriggeredExit>) -> Self {
        Self {
            any_triggered: !triggered_rules.is_empty(),
            critical_exit: triggered_rules.iter().any(|t| t.urgency == Urgency::Critical),
            high_urgency: triggered_rules.iter().any(|t| t.urgency <= Urgency::High),
            triggered_rules,
        }
    }

    pub fn has(&self, rule: ExitRule) -> bool {
        self.triggered_rules.iter().any(|t| t.rule == rule)
    }
}

pub fn evaluate_exits(
    price: f64,
    avg_cost: f64,
    levels: &ExitLevels,
    high_water_mark: Option<f64>,
) -> ExitEvaluation {
    let mut triggered = Vec::new();
    let hard_stop = levels.hard_stop_price;

    if price <= hard_stop {
        triggered.push(TriggeredExit {
            rule: ExitRule::HardStop,
            urgency: Urgency::Critical,
            message: format!("Price {price:.2} <= hard stop {hard_stop:.2}"),
        });
    }

    if let Some(atr_stop) = levels.atr_stop_price.filter(|&stop| price <= stop) {
        triggered.push(TriggeredExit {
            rule: ExitRule::AtrStop,
            urgency: Urgency::High,
            message: format!("Price {price:.2} <= ATR stop {atr_stop:.2}"),
        });
    }

    if let Some(hwm) = high_water_mark.filter(|&hwm| hwm > avg_cost) {
        let trailing = hwm * (1.0 - levels.trailing_stop_pct);
        if price <= trailing {
            triggered.push(TriggeredExit {
                rule: ExitRule::TrailingStop,
                urgency: Urgency::High,
                message: format!(
                    "Price {price:.2} <= trailing stop {trailing:.2} ({:.0}% from high {hwm:.2})",
                    levels.trailing_stop_pct * 100.0
                ),
            });
        }
    }

    if price >= levels.profit_target_price {
        triggered.push(TriggeredExit {
            rule: ExitRule::ProfitTarget,
            urgency: Urgency::Medium,
            message: format!(
                "Price {price:.2} >= profit target {:.2}",
                levels.profit_target_price
            ),
        });
    }

    if hard_stop > 0.0 && price > hard_stop {
        let distance = (price - hard_stop) / price;
        if distance < APPROACHING_STOP_PCT {
            triggered.push(TriggeredExit {
                rule: ExitRule::ApproachingHardStop,
                urgency: Urgency::Warning,
                message: format!(
                    "Only {:.1}% above hard stop {hard_stop:.2}",
                    distance * 100.0
                ),
            });
        }
    }

    ExitEvaluation::from_rules(triggered)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSource {
    Manual,
    AutoRolling,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHeat {
    pub ticker: String,
    pub shares: u64,
    pub current_price: f64,
    pub hard_stop_price: f64,
    pub stop_source: StopSource,
    pub at_risk_usd: f64,
    pub at_risk_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHeat {
    pub portfolio_value_usd: f64,
    pub total_at_risk_usd: f64,
    pub portfolio_heat_pct: f64,
    pub max_heat_pct: f64,
    pub can_add_new_positions: bool,
    pub position_breakdown: Vec<PositionHeat>,
}

/// Fraction of portfolio value lost if every position fell to its hard stop.
///
/// Positions without a usable cost or share count are ignored; missing
/// prices fall back to the cost basis. `None` when `portfolio_value <= 0`.
pub fn portfolio_heat(
    positions: &BTreeMap<String, Position>,
    prices: &BTreeMap<String, f64>,
    portfolio_value: f64,
) -> Option<PortfolioHeat> {
    if portfolio_value <= 0.0 {
        return None;
    }

    let mut breakdown = Vec::new();
    let mut total_at_risk = 0.0;

    for (ticker, pos) in positions {
        if pos.avg_cost <= 0.0 || pos.shares == 0 {
            continue;
        }
        let price = prices.get(ticker).copied().unwrap_or(pos.avg_cost);

        let (stop, source) = match pos.override_stop_price {
            Some(stop) => (stop, StopSource::Manual),
            None if pos.unrealized_pnl_pct(price) > ROLLING_STOP_PNL => {
                (price * (1.0 - DEFAULT_HARD_STOP_PCT), StopSource::AutoRolling)
            }
            None => (pos.hard_stop_price(DEFAULT_HARD_STOP_PCT), StopSource::Default),
        };

        let at_risk = pos.shares as f64 * (price - stop).max(0.0);
        total_at_risk += at_risk;
        breakdown.push(PositionHeat {
            ticker: ticker.clone(),
            shares: pos.shares,
            current_price: price,
            hard_stop_price: stop,
            stop_source: source,
            at_risk_usd: at_risk,
            at_risk_pct: at_risk / portfolio_value,
        });
    }

    let heat = total_at_risk / portfolio_value;
    Some(PortfolioHeat {
        portfolio_value_usd: portfolio_value,
        total_at_risk_usd: total_at_risk,
        portfolio_heat_pct: heat,
        max_heat_pct: MAX_PORTFOLIO_HEAT,
        can_add_new_positions: heat < MAX_PORTFOLIO_HEAT,
        position_breakdown: breakdown,
    })
}

/// Exit assessment for one held ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRisk {
    pub ticker: String,
    pub current_price: f64,
    pub market_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr: Option<f64>,
    pub levels: ExitLevels,
    pub exits: ExitEvaluation,
}

/// Levels and triggered exits from a position's price history.
///
/// The high-water mark is the highest close over the last
/// [`TIME_STOP_DAYS`] bars. `None` when the history is empty.
pub fn assess_position(position: &Position, bars: &[PriceBar]) -> Option<PositionRisk> {
    let last = bars.last()?;
    let price = last.close;
    let atr = atr(bars, ATR_PERIOD);
    let levels = exit_levels(position.avg_cost, atr, position.override_stop_price, Some(price));

    let recent = &bars[bars.len().saturating_sub(TIME_STOP_DAYS as usize)..];
    let high_water_mark = recent.iter().map(|b| b.close).fold(None, |acc: Option<f64>, c| {
        Some(acc.map_or(c, |a| a.max(c)))
    });

    let exits = evaluate_exits(price, position.avg_cost, &levels, high_water_mark);
    Some(PositionRisk {
        ticker: position.ticker.clone(),
        current_price: price,
        market_value: position.market_value(price),
        atr,
        levels,
        exits,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub positions: Vec<PositionRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_heat: Option<PortfolioHeat>,
}

/// Assess every held position and the portfolio as a whole.
///
/// A ticker whose history cannot be fetched is left out of the per-position
/// list and priced at cost for the heat calculation.
pub fn build_risk_report(
    data_port: &dyn PriceDataPort,
    positions: &BTreeMap<String, Position>,
    portfolio_value: f64,
) -> RiskReport {
    let mut assessed = Vec::new();
    let mut prices = BTreeMap::new();

    for (ticker, position) in positions {
        let bars = match data_port.fetch_bars(ticker) {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "no price history for position");
                continue;
            }
        };
        match assess_position(position, &bars) {
            Some(risk) => {
                if risk.exits.critical_exit {
                    tracing::warn!(ticker = %ticker, price = risk.current_price, "hard stop breached");
                }
                prices.insert(ticker.clone(), risk.current_price);
                assessed.push(risk);
            }
            None => tracing::warn!(ticker = %ticker, "empty price history for position"),
        }
    }

    RiskReport {
        positions: assessed,
        portfolio_heat: portfolio_heat(positions, &prices, portfolio_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn bar(i: i64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            ticker: "NVDA".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i),
            open: None,
            high,
            low,
            close,
            volume: None,
        }
    }

    fn position(avg_cost: f64, override_stop: Option<f64>) -> Position {
        Position {
            ticker: "NVDA".into(),
            shares: 10,
            avg_cost,
            override_stop_price: override_stop,
        }
    }

    #[test]
    fn atr_needs_period_plus_one_bars() {
        let bars: Vec<_> = (0..14).map(|i| bar(i, 11.0, 9.0, 10.0)).collect();
        assert!(atr(&bars, 14).is_none());
        assert!(atr(&bars, 0).is_none());
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<_> = (0..15).map(|i| bar(i, 11.0, 9.0, 10.0)).collect();
        assert_relative_eq!(atr(&bars, 14).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_smooths_a_gap() {
        // seed 2.0, then a gap bar with true range 12 and alpha 0.5
        let mut bars: Vec<_> = (0..3).map(|i| bar(i, 11.0, 9.0, 10.0)).collect();
        bars.push(bar(3, 22.0, 20.0, 21.0));
        assert_relative_eq!(atr(&bars, 3).unwrap(), 0.5 * 12.0 + 0.5 * 2.0);
    }

    #[test]
    fn default_levels() {
        let l = exit_levels(100.0, None, None, None);
        assert_relative_eq!(l.hard_stop_price, 88.0);
        assert_relative_eq!(l.hard_stop_pct, -0.12);
        assert_relative_eq!(l.profit_target_price, 120.0);
        assert_eq!(l.time_stop_days, 20);
        assert!(!l.override_stop_active);
        assert!(l.atr_stop_price.is_none());
    }

    #[test]
    fn atr_stop_from_cost() {
        let l = exit_levels(100.0, Some(3.0), None, Some(150.0));
        assert_relative_eq!(l.atr_stop_price.unwrap(), 94.0);
        assert_relative_eq!(l.atr_stop_pct.unwrap(), -0.06);
    }

    #[test]
    fn override_moves_atr_reference_to_price() {
        let l = exit_levels(27.0, Some(10.0), Some(140.0), Some(160.0));
        assert!(l.override_stop_active);
        assert_relative_eq!(l.hard_stop_price, 140.0);
        assert_relative_eq!(l.atr_stop_price.unwrap(), 140.0);
    }

    #[test]
    fn hard_stop_is_critical_and_suppresses_warning() {
        let l = exit_levels(100.0, None, None, None);
        let e = evaluate_exits(87.0, 100.0, &l, None);
        assert!(e.critical_exit);
        assert!(e.has(ExitRule::HardStop));
        assert!(!e.has(ExitRule::ApproachingHardStop));
    }

    #[test]
    fn approaching_stop_warning() {
        let l = exit_levels(100.0, None, None, None);
        let e = evaluate_exits(90.0, 100.0, &l, None);
        assert_eq!(e.triggered_rules.len(), 1);
        assert_eq!(e.triggered_rules[0].rule, ExitRule::ApproachingHardStop);
        assert_eq!(e.triggered_rules[0].urgency, Urgency::Warning);
        assert!(!e.high_urgency);
    }

    #[test]
    fn trailing_stop_only_after_gain() {
        let l = exit_levels(100.0, None, None, None);
        let e = evaluate_exits(91.0, 100.0, &l, Some(99.0));
        assert!(!e.has(ExitRule::TrailingStop));

        let e = evaluate_exits(105.0, 100.0, &l, Some(115.0));
        assert!(e.has(ExitRule::TrailingStop));
        assert!(e.high_urgency);
    }

    #[test]
    fn rules_in_priority_order() {
        let l = exit_levels(100.0, Some(5.0), None, None);
        let e = evaluate_exits(85.0, 100.0, &l, Some(130.0));
        let rules: Vec<_> = e.triggered_rules.iter().map(|t| t.rule).collect();
        assert_eq!(
            rules,
            vec![ExitRule::HardStop, ExitRule::AtrStop, ExitRule::TrailingStop]
        );
    }

    #[test]
    fn profit_target_is_medium() {
        let l = exit_levels(100.0, None, None, None);
        let e = evaluate_exits(121.0, 100.0, &l, None);
        assert!(e.has(ExitRule::ProfitTarget));
        assert!(!e.high_urgency);
    }

    #[test]
    fn heat_default_stop() {
        let positions = BTreeMap::from([("NVDA".to_string(), position(100.0, None))]);
        let prices = BTreeMap::from([("NVDA".to_string(), 110.0)]);
        let heat = portfolio_heat(&positions, &prices, 10_000.0).unwrap();
        // 10 * (110 - 88) = 220
        assert_relative_eq!(heat.total_at_risk_usd, 220.0);
        assert_relative_eq!(heat.portfolio_heat_pct, 0.022);
        assert!(heat.can_add_new_positions);
        assert_eq!(heat.position_breakdown[0].stop_source, StopSource::Default);
    }

    #[test]
    fn heat_rolling_and_manual_stops() {
        let positions = BTreeMap::from([
            ("AMD".to_string(), position(20.0, None)),
            ("NVDA".to_string(), position(100.0, Some(105.0))),
        ]);
        let prices = BTreeMap::from([("AMD".to_string(), 50.0), ("NVDA".to_string(), 110.0)]);
        let heat = portfolio_heat(&positions, &prices, 1_000.0).unwrap();
        let amd = &heat.position_breakdown[0];
        assert_eq!(amd.stop_source, StopSource::AutoRolling);
        assert_relative_eq!(amd.hard_stop_price, 44.0);
        let nvda = &heat.position_breakdown[1];
        assert_eq!(nvda.stop_source, StopSource::Manual);
        assert_relative_eq!(nvda.at_risk_usd, 50.0);
        // 60 + 50 over 1000
        assert_relative_eq!(heat.portfolio_heat_pct, 0.11);
        assert!(!heat.can_add_new_positions);
    }

    #[test]
    fn heat_missing_price_uses_cost() {
        let positions = BTreeMap::from([("MU".to_string(), position(100.0, None))]);
        let heat = portfolio_heat(&positions, &BTreeMap::new(), 10_000.0).unwrap();
        assert_relative_eq!(heat.position_breakdown[0].current_price, 100.0);
        assert_relative_eq!(heat.total_at_risk_usd, 120.0);
    }

    #[test]
    fn heat_requires_positive_portfolio_value() {
        assert!(portfolio_heat(&BTreeMap::new(), &BTreeMap::new(), 0.0).is_none());
    }

    #[test]
    fn assess_uses_recent_high() {
        let mut bars: Vec<_> = (0..20).map(|i| bar(i, 101.0, 99.0, 100.0)).collect();
        bars[15].close = 130.0;
        bars.push(bar(20, 115.0, 110.0, 112.0));
        let risk = assess_position(&position(100.0, None), &bars).unwrap();
        assert_relative_eq!(risk.current_price, 112.0);
        assert_relative_eq!(risk.market_value, 1_120.0);
        assert!(risk.atr.is_some());
        // 130 * 0.92 = 119.6
        assert!(risk.exits.has(ExitRule::TrailingStop));
        assert!(assess_position(&position(100.0, None), &[]).is_none());
    }
}
