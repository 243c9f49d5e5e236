//! Configuration loading and validation.
//!
//! Missing keys fall back to the built-in defaults; present but malformed
//! values are rejected before any run starts.

use crate::domain::config::{FilterConfig, RegimeConfig, SignalConfig, parse_keyword_list};
use crate::domain::error::NewsdeskError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

/// Validate every section used by the CLI.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), NewsdeskError> {
    let filters = load_filter_config(config)?;
    if filters.watchlist.is_empty() {
        return Err(NewsdeskError::config_invalid(
            "filters",
            "watchlist",
            "watchlist must name at least one ticker",
        ));
    }
    load_signal_config(config)?;
    load_regime_config(config)?;
    Ok(())
}

pub fn load_filter_config(config: &dyn ConfigPort) -> Result<FilterConfig, NewsdeskError> {
    let mut filters = FilterConfig::default();

    if let Some(raw) = config.get_string("filters", "watchlist") {
        let tickers = if raw.trim().is_empty() {
            Vec::new()
        } else {
            parse_tickers(&raw)
                .map_err(|e| NewsdeskError::config_invalid("filters", "watchlist", e.to_string()))?
        };
        filters = filters.with_watchlist(tickers);
    }
    if let Some(raw) = config.get_string("filters", "event_keywords") {
        filters.event_keywords = parse_keyword_list(&raw);
    }
    if let Some(raw) = config.get_string("filters", "market_summary_keywords") {
        filters.market_summary_keywords = parse_keyword_list(&raw);
    }

    filters.max_age_hours = parse_number(config, "filters", "max_age_hours", filters.max_age_hours)?;
    if filters.max_age().is_none() {
        return Err(NewsdeskError::config_invalid(
            "filters",
            "max_age_hours",
            "max_age_hours must be a non-negative number of hours within range",
        ));
    }

    Ok(filters)
}

pub fn load_signal_config(config: &dyn ConfigPort) -> Result<SignalConfig, NewsdeskError> {
    let defaults = SignalConfig::default();

    let window: usize = parse_number(config, "signals", "window", defaults.window)?;
    if window == 0 {
        return Err(NewsdeskError::config_invalid(
            "signals",
            "window",
            "window must be at least 1",
        ));
    }

    let hard_stop_pct: f64 =
        parse_number(config, "signals", "hard_stop_pct", defaults.hard_stop_pct)?;
    if hard_stop_pct <= 0.0 || hard_stop_pct >= 1.0 {
        return Err(NewsdeskError::config_invalid(
            "signals",
            "hard_stop_pct",
            "hard_stop_pct must be between 0 and 1",
        ));
    }

    Ok(SignalConfig {
        window,
        hard_stop_pct,
    })
}

pub fn load_regime_config(config: &dyn ConfigPort) -> Result<RegimeConfig, NewsdeskError> {
    let mut regime = RegimeConfig::default();

    if let Some(raw) = config.get_string("regime", "tickers") {
        regime.tickers = parse_tickers(&raw)
            .map_err(|e| NewsdeskError::config_invalid("regime", "tickers", e.to_string()))?;
    }

    regime.ma_period = parse_number(config, "regime", "ma_period", regime.ma_period)?;
    if regime.ma_period == 0 {
        return Err(NewsdeskError::config_invalid(
            "regime",
            "ma_period",
            "ma_period must be at least 1",
        ));
    }

    Ok(regime)
}

/// `[risk] portfolio_value`, if set.
pub fn load_portfolio_value(config: &dyn ConfigPort) -> Result<Option<f64>, NewsdeskError> {
    if config
        .get_string("risk", "portfolio_value")
        .is_none_or(|raw| raw.trim().is_empty())
    {
        return Ok(None);
    }
    let value: f64 = parse_number(config, "risk", "portfolio_value", 0.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(NewsdeskError::config_invalid(
            "risk",
            "portfolio_value",
            "portfolio_value must be a positive amount",
        ));
    }
    Ok(Some(value))
}

fn parse_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, NewsdeskError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            NewsdeskError::config_invalid(section, key, format!("{key} is not a valid number: {raw}"))
        }),
    }
}
