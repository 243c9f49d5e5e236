//! Ticker presence filter.

use super::partition_keep;
use crate::domain::news::NewsItem;

/// Keep items that resolved at least one ticker.
pub fn filter(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let (kept, dropped) = partition_keep(items, |item| !item.normalized_tickers().is_empty());
    tracing::info!(dropped, "ticker presence filter");
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::NewsSource;

    fn item(tickers: &[&str]) -> NewsItem {
        NewsItem {
            source: NewsSource::Sec,
            title: "Fed cuts rates".into(),
            summary: String::new(),
            url: "https://example.com".into(),
            published_at: None,
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            raw_source: String::new(),
        }
    }

    #[test]
    fn drops_items_without_tickers() {
        let (kept, dropped) = filter(vec![item(&[]), item(&["NVDA"]), item(&["  "])]);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn empty_batch() {
        let (kept, dropped) = filter(vec![]);
        assert!(kept.is_empty());
        assert_eq!(dropped, 0);
    }
}
