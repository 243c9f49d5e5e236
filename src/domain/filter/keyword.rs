//! Event / market-summary keyword filter.
//!
//! Event keywords dominate: an item mentioning any event keyword is kept
//! even when it also reads like a market summary. Items matching neither
//! list are kept.

use super::partition_keep;
use crate::domain::news::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordVerdict {
    Event,
    MarketSummary,
    Neutral,
}

impl KeywordVerdict {
    pub fn keeps(self) -> bool {
        !matches!(self, KeywordVerdict::MarketSummary)
    }
}

/// Keyword sets compiled once per run.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    event: Vec<String>,
    market_summary: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(event_keywords: &[S], market_summary_keywords: &[S]) -> Self {
        Self {
            event: compile(event_keywords),
            market_summary: compile(market_summary_keywords),
        }
    }

    pub fn classify(&self, item: &NewsItem) -> KeywordVerdict {
        let text = item.search_text();
        if self.event.iter().any(|k| text.contains(k.as_str())) {
            KeywordVerdict::Event
        } else if self.market_summary.iter().any(|k| text.contains(k.as_str())) {
            KeywordVerdict::MarketSummary
        } else {
            KeywordVerdict::Neutral
        }
    }
}

fn compile<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

pub fn filter(items: Vec<NewsItem>, matcher: &KeywordMatcher) -> (Vec<NewsItem>, usize) {
    let (kept, dropped) = partition_keep(items, |item| matcher.classify(item).keeps());
    tracing::info!(dropped, "event keyword filter");
    (kept, dropped)
}
