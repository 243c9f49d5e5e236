//! Trend report output port.

use crate::domain::error::NewsdeskError;
use crate::domain::universe::TrendReport;
use std::path::Path;

pub trait SignalReportPort {
    fn write(&self, report: &TrendReport, path: &Path) -> Result<(), NewsdeskError>;
}
