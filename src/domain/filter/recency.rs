//! Recency window filter.

use super::partition_keep;
use crate::domain::news::NewsItem;
use chrono::{DateTime, Duration, Utc};

/// Keep items published no more than `max_age_hours` before `now`.
///
/// Items without a timestamp, and records without a url, cannot be
/// verified and are dropped here.
pub fn filter(
    items: Vec<NewsItem>,
    max_age_hours: i64,
    now: DateTime<Utc>,
) -> (Vec<NewsItem>, usize) {
    let max_age = Duration::try_hours(max_age_hours).unwrap_or(Duration::MAX);
    let (kept, dropped) = partition_keep(items, |item| {
        if !item.is_well_formed() {
            return false;
        }
        match item.published_at {
            Some(published) => now - published <= max_age,
            None => false,
        }
    });
    tracing::info!(dropped, max_age_hours, "recency filter");
    (kept, dropped)
}
