#![allow(dead_code)]

use chrono::NaiveDate;
use btscreener::domain::error::ScreenerError;
pub use btscreener::domain::ohlcv::OhlcvBar;
use btscreener::ports::data_port::DataPort;
use std::collections::BTreeMap;

pub struct MockDataPort {
    pub data: BTreeMap<String, Vec<OhlcvBar>>,
    pub errors: BTreeMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenerError::DataFeed {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()),
            None => Err(ScreenerError::NoData { code: code.into() }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        Ok(self.data.keys().cloned().collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDate {
    date(2023, 1, 2) + chrono::Duration::days(i as i64)
}

pub fn make_bar(code: &str, i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: day(i),
        open,
        high,
        low,
        close,
        volume: 10_000,
    }
}

/// Flat base then a steady climb, each bar spanning +/- 0.5 around its close.
pub fn base_then_rally(code: &str, base: usize, rally: usize) -> Vec<OhlcvBar> {
    let mut bars = Vec::with_capacity(base + rally);
    for i in 0..base {
        bars.push(make_bar(code, i, 100.0, 100.5, 99.5, 100.0));
    }
    for j in 0..rally {
        let close = 101.0 + 2.0 * j as f64;
        bars.push(make_bar(code, base + j, close - 1.0, close + 0.5, close - 1.5, close));
    }
    bars
}

/// Two upside breakouts in one uptrend.
///
/// Bars 0..15 rise a point a day without wicks. A shooting star at 15 sets
/// resistance at 117 and bar 17 closes above it with a TD count of 9. Bar 18
/// closes at 120, a gap-down shooting star at 19 lifts resistance to 119,
/// and bar 22 closes back at 120 above it: a breakout on a TD count of 0.
pub fn double_breakout_bars(code: &str) -> Vec<OhlcvBar> {
    let mut bars: Vec<OhlcvBar> = (0..15)
        .map(|i| {
            let c = 100.0 + i as f64;
            make_bar(code, i, c - 1.0, c + 0.5, c - 1.5, c)
        })
        .collect();
    let tail = [
        (114.5, 117.0, 113.9, 114.0),
        (114.5, 115.3, 114.3, 115.0),
        (115.0, 119.0, 114.8, 118.5),
        (118.5, 120.5, 118.0, 120.0),
        (115.5, 119.0, 114.9, 115.0),
        (115.5, 116.3, 115.3, 116.0),
        (116.0, 116.8, 115.8, 116.5),
        (116.5, 120.5, 116.3, 120.0),
    ];
    for (j, (o, h, l, c)) in tail.into_iter().enumerate() {
        bars.push(make_bar(code, 15 + j, o, h, l, c));
    }
    bars
}

/// Deterministic pseudo-random walk with regular hammer and shooting-star
/// bars, long enough to produce zones, breakouts and trend flips.
pub fn choppy_bars(code: &str, n: usize, seed: u64) -> Vec<OhlcvBar> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as f64) / ((1u64 << 31) as f64)
    };

    let mut close = 100.0_f64;
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let drift = (i as f64 / 25.0).sin() * 0.8;
        let open = close;
        close = (open + drift + (next() - 0.5) * 3.0).max(5.0);
        let body_high = open.max(close);
        let body_low = open.min(close);

        let (high, low) = match i % 9 {
            // shooting star: long upper wick, close near the low
            4 => {
                let close_low = body_low;
                close = close_low;
                (body_high + 4.0 + next() * 2.0, close_low - 0.05)
            }
            // hammer: long lower wick, close near the high
            8 => {
                close = body_high;
                (body_high + 0.05, body_low - 4.0 - next() * 2.0)
            }
            _ => (body_high + next() * 0.8, body_low - next() * 0.8),
        };

        bars.push(make_bar(code, i, open, high, low.max(1.0), close));
    }
    bars
}
