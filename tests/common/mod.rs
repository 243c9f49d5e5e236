#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use newsdesk::domain::error::NewsdeskError;
pub use newsdesk::domain::news::{NewsItem, NewsSource};
pub use newsdesk::domain::ohlcv::PriceBar;
use newsdesk::domain::position::Position;
use newsdesk::ports::data_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, NewsdeskError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(NewsdeskError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, NewsdeskError> {
        let mut tickers: Vec<_> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Fixed reference time shared by the pipeline tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_item(
    title: &str,
    source: NewsSource,
    tickers: &[&str],
    hours_ago: i64,
) -> NewsItem {
    NewsItem {
        source,
        title: title.to_string(),
        summary: String::new(),
        url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        published_at: Some(now() - Duration::hours(hours_ago)),
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        raw_source: "test".to_string(),
    }
}

/// Daily bars with high = low = close, starting 2024-01-01.
pub fn bars_from_closes(ticker: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            ticker: ticker.to_string(),
            date: start + Duration::days(i as i64),
            open: Some(close),
            high: close,
            low: close,
            close,
            volume: Some(1_000),
        })
        .collect()
}

pub fn make_position(ticker: &str, shares: u64, avg_cost: f64) -> Position {
    Position {
        ticker: ticker.to_string(),
        shares,
        avg_cost,
        override_stop_price: None,
    }
}

pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date,
            b.open.map(|v| v.to_string()).unwrap_or_default(),
            b.high,
            b.low,
            b.close,
            b.volume.map(|v| v.to_string()).unwrap_or_default()
        ));
    }
    out
}
