//! Run configuration values with built-in defaults.
//!
//! Every filter and engine takes these explicitly; nothing reads
//! module-level lists.

use crate::domain::position::DEFAULT_HARD_STOP_PCT;
use chrono::Duration;
use std::collections::BTreeSet;

pub const DEFAULT_WATCHLIST: [&str; 13] = [
    "NVDA", "META", "AMD", "QQQ", "TSLA", "MCD", "CRDO", "IAU", "NFLX", "APP", "GOOG", "COIN", "MU",
];

pub const DEFAULT_EVENT_KEYWORDS: [&str; 11] = [
    "earnings",
    "guidance",
    "forecast",
    "acquisition",
    "lawsuit",
    "investigation",
    "approval",
    "downgrade",
    "upgrade",
    "raises",
    "cuts",
];

pub const DEFAULT_MARKET_SUMMARY_KEYWORDS: [&str; 6] =
    ["dow", "s&p", "nasdaq", "market", "stocks rally", "live updates"];

pub const DEFAULT_MAX_AGE_HOURS: i64 = 72;
pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_REGIME_TICKERS: [&str; 2] = ["SPY", "QQQ"];
pub const DEFAULT_MA_PERIOD: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub watchlist: BTreeSet<String>,
    pub event_keywords: Vec<String>,
    pub market_summary_keywords: Vec<String>,
    pub max_age_hours: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            event_keywords: DEFAULT_EVENT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            market_summary_keywords: DEFAULT_MARKET_SUMMARY_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }
}

impl FilterConfig {
    pub fn with_watchlist<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.watchlist = tickers
            .into_iter()
            .map(|t| t.as_ref().trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// The recency window, or `None` when `max_age_hours` is negative or
    /// too large to represent.
    pub fn max_age(&self) -> Option<Duration> {
        Duration::try_hours(self.max_age_hours).filter(|d| *d >= Duration::zero())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub window: usize,
    pub hard_stop_pct: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            hard_stop_pct: DEFAULT_HARD_STOP_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegimeConfig {
    pub tickers: Vec<String>,
    pub ma_period: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_REGIME_TICKERS.iter().map(|s| s.to_string()).collect(),
            ma_period: DEFAULT_MA_PERIOD,
        }
    }
}

/// Split a comma separated keyword list, lower-casing and dropping blanks.
pub fn parse_keyword_list(input: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}
