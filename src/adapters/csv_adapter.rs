//! CSV file bar feed.
//!
//! One file per code, `<base>/<CODE>.csv`, with a header row naming at least
//! `date,open,high,low,close`. A `volume` column is optional and defaults to
//! 0. Column order does not matter.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ScreenerError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| ScreenerError::DataFeed {
                reason: format!("missing {name} column"),
            })
        };

        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, ScreenerError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| ScreenerError::DataFeed {
            reason: format!("missing {name} value on line {}", line_of(record)),
        })
}

fn price(record: &StringRecord, index: usize, name: &str) -> Result<f64, ScreenerError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| ScreenerError::DataFeed {
            reason: format!("invalid {name} value on line {}: {e}", line_of(record)),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let path = self.csv_path(code);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ScreenerError::NoData { code: code.into() });
            }
            Err(e) => {
                return Err(ScreenerError::DataFeed {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let columns = Columns::from_headers(rdr.headers()?)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result?;

            let date_str = field(&record, columns.date, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                ScreenerError::DataFeed {
                    reason: format!("invalid date {date_str:?} on line {}: {e}", line_of(&record)),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let volume = match columns.volume.and_then(|i| record.get(i)) {
                None | Some("") => 0,
                Some(v) => v.parse::<f64>().map_err(|e| ScreenerError::DataFeed {
                    reason: format!("invalid volume value on line {}: {e}", line_of(&record)),
                })? as i64,
            };

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: price(&record, columns.open, "open")?,
                high: price(&record, columns.high, "high")?,
                low: price(&record, columns.low, "low")?,
                close: price(&record, columns.close, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScreenerError::DataFeed {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
