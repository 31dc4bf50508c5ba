//! Streaming building blocks shared by the indicators.
//!
//! Each helper owns exactly the history it needs and reports `None` until
//! that history is full.

use std::collections::VecDeque;

use crate::domain::ohlcv::OhlcvBar;

/// Average True Range with Wilder smoothing.
///
/// True range needs the previous close, so the first bar contributes nothing.
/// The average is seeded with the simple mean of the first `period` true
/// ranges and is therefore first valid on bar index `period`.
#[derive(Debug, Clone)]
pub struct WilderAtr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl WilderAtr {
    /// A `period` of 0 is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<f64> {
        let prev_close = self.prev_close.replace(bar.close)?;
        let tr = bar.true_range(prev_close);
        let period = self.period as f64;

        self.value = match self.value {
            Some(atr) => Some((atr * (period - 1.0) + tr) / period),
            None => {
                self.seed_sum += tr;
                self.seed_count += 1;
                (self.seed_count == self.period).then(|| self.seed_sum / period)
            }
        };
        self.value
    }
}

/// Fixed-length window over the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    /// A `period` of 0 is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            values: VecDeque::with_capacity(period),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.period {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    pub fn highest(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn lowest(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.values.iter().copied().reduce(f64::min)
    }
}
