//! Canonical news record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsSource {
    GoogleNews,
    Sec,
}

impl fmt::Display for NewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsSource::GoogleNews => write!(f, "google_news"),
            NewsSource::Sec => write!(f, "sec"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: NewsSource,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tickers: BTreeSet<String>,
    #[serde(default)]
    pub raw_source: String,
}

/// Records read from one store, with the count that did not fit the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsBatch {
    pub items: Vec<NewsItem>,
    pub rejected: usize,
}

impl NewsItem {
    /// A record without a url cannot be audited or deduplicated.
    pub fn is_well_formed(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Title and summary joined and lower-cased, as used for keyword matching.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }

    /// Upper-cased ticker symbols.
    pub fn normalized_tickers(&self) -> BTreeSet<String> {
        self.tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a feed timestamp into UTC.
///
/// Accepts RFC 3339, RFC 2822 and naive ISO-like forms (taken as UTC).
/// Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Any timestamp that is not a parseable string reads as missing, so the
/// record still reaches the recency stage and is counted there.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &raw {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => return Ok(None),
        serde_json::Value::String(s) => parse_timestamp(s),
        _ => None,
    };
    if parsed.is_none() {
        tracing::warn!(value = %raw, "unparseable published_at, treating as missing");
    }
    Ok(parsed)
}
