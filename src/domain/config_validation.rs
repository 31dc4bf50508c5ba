//! Configuration validation.
//!
//! Checks every screener setting before a scan or replay starts. Missing
//! keys fall back to the indicator defaults; only present-but-wrong values
//! are rejected.

use crate::domain::error::ScreenerError;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_screener_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_supertrend(config)?;
    validate_wick(config)?;
    validate_driver(config)?;
    validate_slippage(config)?;
    validate_dates(config)?;
    validate_codes(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_supertrend(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let factor = config.get_double("supertrend", "factor", 3.0);
    if factor <= 0.0 {
        return Err(invalid("supertrend", "factor", "factor must be positive"));
    }
    let period = config.get_int("supertrend", "period", 7);
    if period < 1 {
        return Err(invalid("supertrend", "period", "period must be at least 1"));
    }
    Ok(())
}

fn validate_wick(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let multiplier = config.get_double("wick", "wick_multiplier_min", 2.5);
    if multiplier < 0.0 {
        return Err(invalid(
            "wick",
            "wick_multiplier_min",
            "wick_multiplier_min must be non-negative",
        ));
    }
    let close_pct = config.get_double("wick", "close_percent_max", 0.35);
    if !(0.0..=1.0).contains(&close_pct) {
        return Err(invalid(
            "wick",
            "close_percent_max",
            "close_percent_max must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_driver(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let size = config.get_int("driver", "order_size", 1);
    if size < 1 || size > i64::from(u32::MAX) {
        return Err(invalid("driver", "order_size", "order_size must be a positive integer"));
    }
    let max_td = config.get_int("driver", "max_entry_td", -1);
    if max_td < -1 || max_td > 9 {
        return Err(invalid(
            "driver",
            "max_entry_td",
            "max_entry_td must be -1 (unbounded) or between 0 and 9",
        ));
    }
    Ok(())
}

fn validate_slippage(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_double("broker", "slippage_pct", 0.0);
    if value < 0.0 {
        return Err(invalid("broker", "slippage_pct", "slippage_pct must be non-negative"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let start = config_date(config, "data", "start_date")?;
    let end = config_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("data", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

/// Read an optional YYYY-MM-DD date.
pub fn config_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, ScreenerError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    section,
                    key,
                    &format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    match config.get_string("universe", "codes") {
        Some(codes) => {
            parse_codes(&codes)?;
            Ok(())
        }
        None => Ok(()),
    }
}
