//! JSON file adapters for news batches, positions and signal reports.

use crate::domain::error::NewsdeskError;
use crate::domain::news::{NewsBatch, NewsItem};
use crate::domain::position::Position;
use crate::domain::universe::TrendReport;
use crate::ports::news_port::NewsPort;
use crate::ports::position_port::PositionPort;
use crate::ports::signal_port::SignalReportPort;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn json_error(path: &Path, source: serde_json::Error) -> NewsdeskError {
    NewsdeskError::Json {
        file: path.display().to_string(),
        source,
    }
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), NewsdeskError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|e| json_error(path, e))?;
    fs::write(path, body)?;
    Ok(())
}

/// News batches stored as JSON arrays of records.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNewsAdapter;

impl NewsPort for JsonNewsAdapter {
    /// A record that does not fit the schema is skipped with a warning;
    /// a file that is not a JSON array fails the whole load.
    fn load(&self, path: &Path) -> Result<NewsBatch, NewsdeskError> {
        let content = fs::read_to_string(path)?;
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| json_error(path, e))?;

        let mut batch = NewsBatch {
            items: Vec::with_capacity(raw.len()),
            rejected: 0,
        };
        for (idx, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<NewsItem>(value) {
                Ok(item) => batch.items.push(item),
                Err(e) => {
                    batch.rejected += 1;
                    tracing::warn!(
                        file = %path.display(),
                        index = idx,
                        error = %e,
                        "skipping malformed news record"
                    );
                }
            }
        }

        tracing::info!(
            file = %path.display(),
            count = batch.items.len(),
            rejected = batch.rejected,
            "loaded news"
        );
        Ok(batch)
    }

    fn save(&self, items: &[NewsItem], path: &Path) -> Result<(), NewsdeskError> {
        write_json(items, path)?;
        tracing::info!(file = %path.display(), count = items.len(), "saved news");
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PositionsFile {
    #[serde(default)]
    positions: Vec<Position>,
}

pub struct JsonPositionAdapter {
    path: PathBuf,
}

impl JsonPositionAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PositionPort for JsonPositionAdapter {
    fn load_positions(&self) -> Result<Vec<Position>, NewsdeskError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(file = %self.path.display(), "no positions file, assuming none held");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let file: PositionsFile =
            serde_json::from_str(&content).map_err(|e| json_error(&self.path, e))?;
        Ok(file.positions)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSignalReportAdapter;

impl SignalReportPort for JsonSignalReportAdapter {
    fn write(&self, report: &TrendReport, path: &Path) -> Result<(), NewsdeskError> {
        write_json(report, path)?;
        tracing::info!(
            file = %path.display(),
            signals = report.signal_count(),
            "wrote trend report"
        );
        Ok(())
    }
}
