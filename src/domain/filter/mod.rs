//! Per-stage news filters.
//!
//! Every stage consumes its input batch and returns `(kept, dropped_count)`.
//! Stages are pure: the only time-dependent one takes `now` as an argument.

pub mod dedup;
pub mod keyword;
pub mod recency;
pub mod tickers;
pub mod watchlist;

use crate::domain::news::NewsItem;

/// Keep items matching `keep`, preserving order, and count the rest.
pub(crate) fn partition_keep<F>(items: Vec<NewsItem>, mut keep: F) -> (Vec<NewsItem>, usize)
where
    F: FnMut(&NewsItem) -> bool,
{
    let before = items.len();
    let kept: Vec<NewsItem> = items.into_iter().filter(|item| keep(item)).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
