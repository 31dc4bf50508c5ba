//! Screener rows built from the last two snapshots of a symbol, and the
//! breakout alert filter applied to them.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::domain::pipeline::Snapshot;

pub const EVENT_TREND_UP: &str = "Bull";
pub const EVENT_TREND_DOWN: &str = "Bear";
pub const EVENT_FLIP: &str = "Flip";
pub const EVENT_BREAKOUT: &str = "Breakout";
pub const EVENT_TD_WARN: &str = "Warn";
pub const EVENT_TD_FRESH: &str = "Fresh";

/// Current and previous values of every indicator line for one code.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub code: String,
    pub date: NaiveDate,
    pub close: f64,
    pub prev_close: Option<f64>,
    pub trend: Option<i8>,
    pub prev_trend: Option<i8>,
    pub stop: Option<f64>,
    pub support: Option<f64>,
    pub prev_support: Option<f64>,
    pub resistance: Option<f64>,
    pub prev_resistance: Option<f64>,
    pub breakout: i8,
    pub td_count: Option<i32>,
    pub prev_td_count: Option<i32>,
    pub td_reversal: Option<i8>,
    pub prev_td_reversal: Option<i8>,
}

/// Summarize the last bar against the one before it.
pub fn summarize(code: &str, snapshots: &[Snapshot]) -> Option<SummaryRow> {
    let (last, rest) = snapshots.split_last()?;
    let prev = rest.last();

    Some(SummaryRow {
        code: code.to_string(),
        date: last.date,
        close: last.close,
        prev_close: prev.map(|p| p.close),
        trend: last.trend,
        prev_trend: prev.and_then(|p| p.trend),
        stop: last.stop,
        support: last.support,
        prev_support: prev.and_then(|p| p.support),
        resistance: last.resistance,
        prev_resistance: prev.and_then(|p| p.resistance),
        breakout: last.breakout,
        td_count: last.td_count,
        prev_td_count: prev.and_then(|p| p.td_count),
        td_reversal: last.td_reversal,
        prev_td_reversal: prev.and_then(|p| p.td_reversal),
    })
}

impl SummaryRow {
    /// +1 if the trend turned up on the last bar, -1 if it turned down.
    pub fn flip(&self) -> i8 {
        match (self.trend, self.prev_trend) {
            (Some(t), Some(p)) if t > 0 && p <= 0 => 1,
            (Some(t), Some(p)) if t < 0 && p >= 0 => -1,
            _ => 0,
        }
    }

    pub fn trend_events(&self) -> Vec<&'static str> {
        let mut events = Vec::new();
        match self.trend {
            Some(t) if t > 0 => events.push(EVENT_TREND_UP),
            Some(t) if t < 0 => events.push(EVENT_TREND_DOWN),
            _ => {}
        }
        if self.flip() != 0 {
            events.push(EVENT_FLIP);
        }
        if self.breakout != 0 {
            events.push(EVENT_BREAKOUT);
        }
        events
    }

    /// Count first, then `Warn` on a reversal bar and `Fresh` when a new
    /// count starts right after one.
    pub fn td_events(&self) -> Vec<String> {
        let Some(count) = self.td_count else {
            return Vec::new();
        };
        let mut events = vec![count.to_string()];
        if self.td_reversal.is_some_and(|r| r != 0) {
            events.push(EVENT_TD_WARN.to_string());
        }
        if count.abs() == 1 && self.prev_td_reversal.is_some_and(|r| r != 0) {
            events.push(EVENT_TD_FRESH.to_string());
        }
        events
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alert {
    Long,
    Short,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Long => write!(f, "long"),
            Alert::Short => write!(f, "short"),
        }
    }
}

/// Long when the close left the zone upward from inside it, short when it
/// left downward. Missing levels never alert.
pub fn classify_breakout(row: &SummaryRow) -> Option<Alert> {
    let prev_close = row.prev_close?;
    let support = row.support?;
    let resistance = row.resistance?;

    let was_in_zone = prev_close < resistance && prev_close > support;
    if !was_in_zone {
        return None;
    }
    if row.close > resistance {
        Some(Alert::Long)
    } else if row.close < support {
        Some(Alert::Short)
    } else {
        None
    }
}

/// Screener order: highest TD count first, then breakout, then trend.
/// Rows with missing values sort after those that have them.
pub fn rank_rows(rows: &mut [SummaryRow]) {
    fn desc<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    rows.sort_by(|a, b| {
        desc(a.td_count, b.td_count)
            .then_with(|| b.breakout.cmp(&a.breakout))
            .then_with(|| desc(a.trend, b.trend))
            .then_with(|| a.code.cmp(&b.code))
    });
}
