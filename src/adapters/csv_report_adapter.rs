//! CSV report adapter implementing ReportPort.
//!
//! Writes one `<CODE>.csv` per scanned code with every snapshot, plus a
//! `summary.csv` holding the ranked screener rows.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::error::ScreenerError;
use crate::domain::pipeline::Snapshot;
use crate::domain::summary::{SummaryRow, classify_breakout};
use crate::ports::report_port::ReportPort;

pub const SUMMARY_FILE: &str = "summary.csv";

const SNAPSHOT_HEADER: [&str; 12] = [
    "date",
    "close",
    "trend",
    "stop",
    "support",
    "resistance",
    "breakout",
    "wick_buy",
    "wick_sell",
    "td_count",
    "td_reversal",
    "trade_state",
];

const SUMMARY_HEADER: [&str; 12] = [
    "code",
    "date",
    "close",
    "trend",
    "stop",
    "support",
    "resistance",
    "breakout",
    "td_count",
    "trend_events",
    "td_events",
    "alert",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write snapshot rows for one code to any writer.
pub fn write_snapshot_csv<W: Write>(
    writer: W,
    snapshots: &[Snapshot],
) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SNAPSHOT_HEADER)?;

    for s in snapshots {
        wtr.write_record([
            s.date.to_string(),
            s.close.to_string(),
            opt(s.trend),
            opt(s.stop),
            opt(s.support),
            opt(s.resistance),
            s.breakout.to_string(),
            opt(s.wick.buy()),
            opt(s.wick.sell()),
            opt(s.td_count),
            opt(s.td_reversal),
            s.trade_state.map(|t| t.name().to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write summary rows, in the order given, to any writer.
pub fn write_summary_csv<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;

    for row in rows {
        wtr.write_record([
            row.code.clone(),
            row.date.to_string(),
            row.close.to_string(),
            opt(row.trend),
            opt(row.stop),
            opt(row.support),
            opt(row.resistance),
            row.breakout.to_string(),
            opt(row.td_count),
            row.trend_events().join(" "),
            row.td_events().join(" "),
            opt(classify_breakout(row)),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn create(&self, file_name: &str) -> Result<fs::File, ScreenerError> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(fs::File::create(self.output_dir.join(file_name))?)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_snapshots(&mut self, code: &str, snapshots: &[Snapshot]) -> Result<(), ScreenerError> {
        let file = self.create(&format!("{code}.csv"))?;
        write_snapshot_csv(file, snapshots)?;
        info!(code, rows = snapshots.len(), dir = %self.output_dir.display(), "snapshots written");
        Ok(())
    }

    fn write_summaries(&mut self, rows: &[SummaryRow]) -> Result<(), ScreenerError> {
        let file = self.create(SUMMARY_FILE)?;
        write_summary_csv(file, rows)?;
        info!(rows = rows.len(), dir = %self.output_dir.display(), "summary written");
        Ok(())
    }
}
