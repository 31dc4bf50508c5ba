//! Universe of codes to screen.
//!
//! Code lists (index members, personal watch lists) are injected through
//! configuration or the command line; nothing here embeds a basket.

use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Bars needed before every indicator in the pipeline has produced a value.
pub const MIN_OHLCV_BARS: usize = 13;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("all codes failed validation")]
    AllCodesFailed,
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone)]
pub struct LoadedCode {
    pub code: String,
    pub bars: Vec<OhlcvBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

pub struct UniverseLoadResult {
    pub loaded: Vec<LoadedCode>,
    pub skipped: Vec<SkippedCode>,
}

/// Fetch every code from the feed, skipping the ones that cannot warm up.
///
/// Fails only when no code survives.
pub fn load_universe(
    data_port: &dyn DataPort,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    minimum_bars: usize,
) -> Result<UniverseLoadResult, UniverseError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let bars = match data_port.fetch_ohlcv(code, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(%code, error = %e, "skipping code");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(%code, "skipping code, no data found");
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < minimum_bars {
            warn!(
                %code,
                bars = bars.len(),
                minimum = minimum_bars,
                "skipping code, not enough bars"
            );
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        info!(%code, bars = bars.len(), "loaded");
        loaded.push(LoadedCode {
            code: code.clone(),
            bars,
        });
    }

    if loaded.is_empty() {
        return Err(UniverseError::AllCodesFailed);
    }

    Ok(UniverseLoadResult { loaded, skipped })
}
