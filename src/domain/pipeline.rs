//! Named filtering pipelines and their drop statistics.
//!
//! Hygiene: recency → ticker presence → dedup(ticker, source).
//! Trade: recency → ticker presence → watchlist → event keywords →
//! dedup(ticker, source).

use crate::domain::config::FilterConfig;
use crate::domain::error::NewsdeskError;
use crate::domain::filter::keyword::KeywordMatcher;
use crate::domain::filter::{dedup, keyword, recency, tickers, watchlist};
use crate::domain::news::NewsItem;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Hygiene,
    Trade,
}

impl PipelineKind {
    pub fn stages(self) -> &'static [Stage] {
        match self {
            PipelineKind::Hygiene => &[Stage::Recency, Stage::TickerPresence, Stage::Dedup],
            PipelineKind::Trade => &[
                Stage::Recency,
                Stage::TickerPresence,
                Stage::Watchlist,
                Stage::EventKeyword,
                Stage::Dedup,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PipelineKind::Hygiene => "hygiene",
            PipelineKind::Trade => "trade",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Recency,
    TickerPresence,
    Watchlist,
    EventKeyword,
    Dedup,
}

impl Stage {
    /// Key used in persisted statistics.
    pub fn stat_key(self) -> &'static str {
        match self {
            Stage::Recency => "dropped_old",
            Stage::TickerPresence => "dropped_no_tickers",
            Stage::Watchlist => "dropped_not_in_watchlist",
            Stage::EventKeyword => "dropped_market_summary",
            Stage::Dedup => "dropped_duplicates",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Recency => "old/unknown",
            Stage::TickerPresence => "no tickers",
            Stage::Watchlist => "not in watchlist",
            Stage::EventKeyword => "market summary",
            Stage::Dedup => "duplicates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDrop {
    pub stage: Stage,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub pipeline: PipelineKind,
    pub input_count: usize,
    pub stages: Vec<StageDrop>,
    pub output_count: usize,
}

impl PipelineStats {
    pub fn dropped(&self, stage: Stage) -> Option<usize> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.dropped)
    }

    pub fn total_dropped(&self) -> usize {
        self.stages.iter().map(|s| s.dropped).sum()
    }

    /// Drops plus survivors account for every input item.
    pub fn is_balanced(&self) -> bool {
        self.total_dropped() + self.output_count == self.input_count
    }
}

impl Serialize for PipelineStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len() + 3))?;
        map.serialize_entry("pipeline", self.pipeline.name())?;
        map.serialize_entry("input_count", &self.input_count)?;
        for s in &self.stages {
            map.serialize_entry(s.stage.stat_key(), &s.dropped)?;
        }
        map.serialize_entry("output_count", &self.output_count)?;
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub items: Vec<NewsItem>,
    pub stats: PipelineStats,
}

/// Reject configurations that invalidate a whole run.
pub fn validate_for(kind: PipelineKind, config: &FilterConfig) -> Result<(), NewsdeskError> {
    if config.max_age().is_none() {
        return Err(NewsdeskError::config_invalid(
            "filters",
            "max_age_hours",
            "max_age_hours must be a non-negative number of hours within range",
        ));
    }
    if kind == PipelineKind::Trade && config.watchlist.iter().all(|t| t.trim().is_empty()) {
        return Err(NewsdeskError::config_invalid(
            "filters",
            "watchlist",
            "trade pipeline requires a non-empty watchlist",
        ));
    }
    Ok(())
}

/// Run one named pipeline over an immutable snapshot of `items`.
pub fn run(
    kind: PipelineKind,
    items: &[NewsItem],
    config: &FilterConfig,
    now: DateTime<Utc>,
) -> Result<PipelineOutput, NewsdeskError> {
    validate_for(kind, config)?;

    tracing::info!(pipeline = %kind, input = items.len(), "running pipeline");

    let matcher = KeywordMatcher::new(
        config.event_keywords.as_slice(),
        config.market_summary_keywords.as_slice(),
    );
    let input_count = items.len();
    let mut current = items.to_vec();
    let mut stages = Vec::with_capacity(kind.stages().len());

    for &stage in kind.stages() {
        let (kept, dropped) = match stage {
            Stage::Recency => recency::filter(current, config.max_age_hours, now),
            Stage::TickerPresence => tickers::filter(current),
            Stage::Watchlist => watchlist::filter(current, &config.watchlist),
            Stage::EventKeyword => keyword::filter(current, &matcher),
            Stage::Dedup => dedup::dedup_by_ticker_source(current),
        };
        stages.push(StageDrop { stage, dropped });
        current = kept;
    }

    let stats = PipelineStats {
        pipeline: kind,
        input_count,
        stages,
        output_count: current.len(),
    };
    debug_assert!(stats.is_balanced());

    tracing::info!(
        pipeline = %kind,
        input = stats.input_count,
        output = stats.output_count,
        "pipeline complete"
    );

    Ok(PipelineOutput {
        items: current,
        stats,
    })
}

/// Run both pipelines over the same snapshot.
pub fn run_all(
    items: &[NewsItem],
    config: &FilterConfig,
    now: DateTime<Utc>,
) -> Result<(PipelineOutput, PipelineOutput), NewsdeskError> {
    let hygiene = run(PipelineKind::Hygiene, items, config, now)?;
    let trade = run(PipelineKind::Trade, items, config, now)?;
    Ok((hygiene, trade))
}
