//! CSV price history adapter: one `<TICKER>.csv` file per symbol.

use crate::domain::error::NewsdeskError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    #[serde(default)]
    open: Option<f64>,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

impl PriceDataPort for CsvPriceAdapter {
    /// Bars sorted by date. A missing file yields no bars.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, NewsdeskError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no price file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(NewsdeskError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.deserialize::<CsvRow>() {
            let row = result.map_err(|e| NewsdeskError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            bars.push(PriceBar {
                ticker: ticker.to_uppercase(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.map(|v| v as i64),
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, NewsdeskError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| NewsdeskError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".csv") {
                tickers.push(stem.to_uppercase());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
