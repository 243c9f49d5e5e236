//! Raw feed ingestion: normalize records, merge batches, drop repeats.

use crate::domain::filter::dedup;
use crate::domain::news::NewsItem;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub input_count: usize,
    pub dropped_malformed: usize,
    pub dropped_duplicates: usize,
    pub output_count: usize,
}

impl IngestStats {
    pub fn is_balanced(&self) -> bool {
        self.dropped_malformed + self.dropped_duplicates + self.output_count == self.input_count
    }
}

/// Remove markup and collapse whitespace runs.
pub fn clean_text(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize one raw record. `None` when the title or url is empty.
pub fn normalize(item: NewsItem) -> Option<NewsItem> {
    let title = clean_text(&item.title);
    let url = item.url.trim().to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    Some(NewsItem {
        title,
        summary: clean_text(&item.summary),
        url,
        tickers: item.normalized_tickers(),
        raw_source: item.raw_source.trim().to_string(),
        ..item
    })
}

/// Merge feed batches into one deduplicated list, newest first.
pub fn ingest<I>(batches: I) -> (Vec<NewsItem>, IngestStats)
where
    I: IntoIterator<Item = Vec<NewsItem>>,
{
    let mut stats = IngestStats::default();
    let mut normalized = Vec::new();

    for batch in batches {
        stats.input_count += batch.len();
        for item in batch {
            match normalize(item) {
                Some(item) => normalized.push(item),
                None => stats.dropped_malformed += 1,
            }
        }
    }

    let (items, dropped) = dedup::dedup_by_title_url(normalized);
    stats.dropped_duplicates = dropped;
    stats.output_count = items.len();

    tracing::info!(
        input = stats.input_count,
        malformed = stats.dropped_malformed,
        duplicates = stats.dropped_duplicates,
        output = stats.output_count,
        "ingest complete"
    );

    (items, stats)
}
