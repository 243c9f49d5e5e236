//! Watchlist allow-list filter.

use super::partition_keep;
use crate::domain::news::NewsItem;
use std::collections::BTreeSet;

/// Keep items sharing at least one ticker with `watchlist` (case-insensitive).
pub fn filter(items: Vec<NewsItem>, watchlist: &BTreeSet<String>) -> (Vec<NewsItem>, usize) {
    let allowed: BTreeSet<String> = watchlist.iter().map(|t| t.trim().to_uppercase()).collect();
    let (kept, dropped) = partition_keep(items, |item| {
        item.normalized_tickers()
            .iter()
            .any(|t| allowed.contains(t))
    });
    tracing::info!(dropped, watchlist_size = allowed.len(), "watchlist filter");
    (kept, dropped)
}
