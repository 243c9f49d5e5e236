//! Composite-key deduplication.
//!
//! Each item maps to zero or more keys. Per key the newest item wins and
//! exact timestamp ties keep the first seen. An item survives if it wins
//! at least one key and then appears once, newest first.

use crate::domain::news::{NewsItem, NewsSource};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

pub fn dedup<K, F>(items: Vec<NewsItem>, key_fn: F) -> (Vec<NewsItem>, usize)
where
    K: Eq + Hash,
    F: Fn(&NewsItem) -> Vec<K>,
{
    let mut winners: HashMap<K, usize> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        for key in key_fn(item) {
            match winners.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(mut slot) => {
                    if item.published_at > items[*slot.get()].published_at {
                        slot.insert(idx);
                    }
                }
            }
        }
    }

    let surviving: BTreeSet<usize> = winners.into_values().collect();
    let before = items.len();
    let mut kept: Vec<NewsItem> = items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| surviving.contains(idx))
        .map(|(_, item)| item)
        .collect();
    sort_newest_first(&mut kept);
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Stable sort by `published_at` descending; undated items go last.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Ingestion key: one entry per `(normalized title, url)`.
pub fn title_url_key(item: &NewsItem) -> Vec<(String, String)> {
    vec![(item.normalized_title(), item.url.trim().to_string())]
}

/// Fan-out key: one entry per `(ticker, source)` the item concerns.
pub fn ticker_source_keys(item: &NewsItem) -> Vec<(String, NewsSource)> {
    item.normalized_tickers()
        .into_iter()
        .map(|ticker| (ticker, item.source))
        .collect()
}

pub fn dedup_by_title_url(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let (kept, dropped) = dedup(items, title_url_key);
    tracing::info!(dropped, "dedup by (title, url)");
    (kept, dropped)
}

pub fn dedup_by_ticker_source(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let (kept, dropped) = dedup(items, ticker_source_keys);
    tracing::info!(dropped, "dedup by (ticker, source)");
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn item(title: &str, source: NewsSource, tickers: &[&str], at: DateTime<Utc>) -> NewsItem {
        NewsItem {
            source,
            title: title.into(),
            summary: String::new(),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            published_at: Some(at),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            raw_source: String::new(),
        }
    }

    #[test]
    fn later_timestamp_wins() {
        let older = item("a", NewsSource::Sec, &["NVDA"], t0());
        let newer = item("b", NewsSource::Sec, &["NVDA"], t0() + Duration::hours(1));

        let (kept, dropped) = dedup_by_ticker_source(vec![older.clone(), newer.clone()]);
        assert_eq!(kept, vec![newer.clone()]);
        assert_eq!(dropped, 1);

        let (kept, _) = dedup_by_ticker_source(vec![newer.clone(), older]);
        assert_eq!(kept, vec![newer]);
    }

    #[test]
    fn tie_keeps_first_seen() {
        let first = item("first", NewsSource::Sec, &["MU"], t0());
        let second = item("second", NewsSource::Sec, &["MU"], t0());
        let (kept, dropped) = dedup_by_ticker_source(vec![first.clone(), second]);
        assert_eq!(kept, vec![first]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn different_sources_do_not_collide() {
        let a = item("a", NewsSource::Sec, &["NVDA"], t0());
        let b = item("b", NewsSource::GoogleNews, &["NVDA"], t0());
        let (kept, dropped) = dedup_by_ticker_source(vec![a, b]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn multi_ticker_item_survives_through_any_ticker() {
        // b wins NVDA, a still wins AMD.
        let a = item("a", NewsSource::Sec, &["NVDA", "AMD"], t0());
        let b = item("b", NewsSource::Sec, &["NVDA"], t0() + Duration::hours(1));
        let (kept, dropped) = dedup_by_ticker_source(vec![a.clone(), b.clone()]);
        assert_eq!(kept, vec![b, a]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn multi_ticker_item_appears_once() {
        let a = item("a", NewsSource::Sec, &["NVDA", "AMD", "MU"], t0());
        let (kept, dropped) = dedup_by_ticker_source(vec![a]);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn multi_ticker_item_beaten_everywhere_is_dropped() {
        let a = item("a", NewsSource::Sec, &["NVDA", "AMD"], t0());
        let b = item("b", NewsSource::Sec, &["NVDA", "AMD"], t0() + Duration::hours(2));
        let (kept, dropped) = dedup_by_ticker_source(vec![a, b.clone()]);
        assert_eq!(kept, vec![b]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn ticker_case_is_ignored_for_keys() {
        let a = item("a", NewsSource::Sec, &["nvda"], t0());
        let b = item("b", NewsSource::Sec, &["NVDA"], t0() + Duration::minutes(5));
        let (kept, _) = dedup_by_ticker_source(vec![a, b.clone()]);
        assert_eq!(kept, vec![b]);
    }

    #[test]
    fn output_is_newest_first() {
        let a = item("a", NewsSource::Sec, &["A"], t0());
        let b = item("b", NewsSource::Sec, &["B"], t0() + Duration::hours(3));
        let c = item("c", NewsSource::Sec, &["C"], t0() + Duration::hours(1));
        let (kept, _) = dedup_by_ticker_source(vec![a, b, c]);
        let titles: Vec<_> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn title_url_dedup_normalizes_title() {
        let mut a = item("Big  News", NewsSource::GoogleNews, &[], t0());
        let mut b = item("big news", NewsSource::Sec, &[], t0() + Duration::hours(1));
        a.url = "https://example.com/x".into();
        b.url = "https://example.com/x".into();
        let (kept, dropped) = dedup_by_title_url(vec![a, b.clone()]);
        assert_eq!(kept, vec![b]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn title_url_dedup_keeps_distinct_urls() {
        let mut a = item("same", NewsSource::GoogleNews, &[], t0());
        let mut b = item("same", NewsSource::GoogleNews, &[], t0());
        a.url = "https://example.com/1".into();
        b.url = "https://example.com/2".into();
        let (kept, dropped) = dedup_by_title_url(vec![a, b]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn undated_items_sort_last() {
        let mut undated = item("u", NewsSource::Sec, &["X"], t0());
        undated.published_at = None;
        let dated = item("d", NewsSource::Sec, &["Y"], t0());
        let (kept, _) = dedup_by_ticker_source(vec![undated, dated]);
        assert_eq!(kept[0].title, "d");
        assert_eq!(kept[1].title, "u");
    }
}
