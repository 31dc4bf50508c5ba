//! TD Sequential exhaustion count.
//!
//! td_base(n) compares close[n] with close[n + 4] (n bars back): +1 higher,
//! -1 lower, 0 equal. The count is the signed run of bars, starting with the
//! current one, that share td_base(0); it looks back at most 8 further bars,
//! so |count| <= 9.
//!
//! Once |count| > 7 a reversal is reported when the current bar also makes a
//! higher high (for +1) or lower low (for -1) than two bars back.
//!
//! Warmup: 13 bars of history are needed; earlier bars are invalid.

use std::collections::VecDeque;

use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;

const COMPARE_LOOKBACK: usize = 4;
const EXTREME_LOOKBACK: usize = 2;
const RUN_LENGTH: usize = 8;
const REVERSAL_THRESHOLD: i32 = 7;

/// Bars of history required before the count is valid.
pub const TD_WARMUP_BARS: usize = RUN_LENGTH + COMPARE_LOOKBACK + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TdPoint {
    pub count: i32,
    pub reversal: i8,
}

#[derive(Debug, Clone, Copy)]
struct PriceSample {
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Clone)]
pub struct TdSequential {
    history: VecDeque<PriceSample>,
    state: TdPoint,
}

impl Default for TdSequential {
    fn default() -> Self {
        Self::new()
    }
}

impl TdSequential {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(TD_WARMUP_BARS),
            state: TdPoint::default(),
        }
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::TdSequential
    }

    /// Last computed count and reversal; zero at stream start.
    pub fn state(&self) -> &TdPoint {
        &self.state
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<TdPoint> {
        if self.history.len() == TD_WARMUP_BARS {
            self.history.pop_front();
        }
        self.history.push_back(PriceSample {
            high: bar.high,
            low: bar.low,
            close: bar.close,
        });

        if self.history.len() < TD_WARMUP_BARS {
            return None;
        }

        let base = self.td_base(0);
        let mut count = base as i32;
        for offset in 1..=RUN_LENGTH {
            if self.td_base(offset) == base {
                count += base as i32;
            } else {
                break;
            }
        }

        let reversal = if count.abs() > REVERSAL_THRESHOLD {
            self.ta_base(0)
        } else {
            0
        };

        self.state = TdPoint { count, reversal };
        Some(self.state)
    }

    /// Sample `offset` bars back from the newest.
    fn at(&self, offset: usize) -> &PriceSample {
        &self.history[self.history.len() - 1 - offset]
    }

    fn td_base(&self, offset: usize) -> i8 {
        let close = self.at(offset).close;
        let earlier = self.at(offset + COMPARE_LOOKBACK).close;
        if close > earlier {
            1
        } else if close < earlier {
            -1
        } else {
            0
        }
    }

    fn ta_base(&self, offset: usize) -> i8 {
        let base = self.td_base(offset);
        let current = self.at(offset);
        let earlier = self.at(offset + EXTREME_LOOKBACK);
        if base == 1 && current.high > earlier.high {
            1
        } else if base == -1 && current.low < earlier.low {
            -1
        } else {
            0
        }
    }
}

pub fn calculate_td_sequential(bars: &[OhlcvBar]) -> Vec<Option<TdPoint>> {
    let mut td = TdSequential::new();
    bars.iter().map(|bar| td.update(bar)).collect()
}
