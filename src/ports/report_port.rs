//! Reporting port trait.

use crate::domain::error::ScreenerError;
use crate::domain::pipeline::Snapshot;
use crate::domain::summary::SummaryRow;

/// Port for handing per-bar snapshots and summary rows to a reporter.
pub trait ReportPort {
    fn write_snapshots(&mut self, code: &str, snapshots: &[Snapshot]) -> Result<(), ScreenerError>;

    fn write_summaries(&mut self, rows: &[SummaryRow]) -> Result<(), ScreenerError>;
}
