//! Reversal wick candle detector.
//!
//! A reversal wick is a long shadow relative to the body:
//! - buy: (body_low - low) >= wick_multiplier_min * body_range and the close
//!   sits in the top `close_percent_max` of the bar's range
//! - sell: (high - body_high) >= wick_multiplier_min * body_range and the
//!   close sits in the bottom `close_percent_max` of the range
//!
//! Stateless: each bar is judged on its own.

use crate::domain::indicator::{IndicatorType, scale_x100};
use crate::domain::ohlcv::OhlcvBar;

/// Stand-in for a zero high-low range when locating the close within the
/// bar. With a zero range close - low is also zero, so close_percent is 0.
pub const ZERO_RANGE_SUBSTITUTE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WickParams {
    pub wick_multiplier_min: f64,
    pub close_percent_max: f64,
}

impl Default for WickParams {
    fn default() -> Self {
        Self {
            wick_multiplier_min: 2.5,
            close_percent_max: 0.35,
        }
    }
}

/// Result of evaluating one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WickSignal {
    #[default]
    None,
    /// Bullish reversal; the wick level is the bar's low.
    Buy(f64),
    /// Bearish reversal; the wick level is the bar's high.
    Sell(f64),
}

impl WickSignal {
    pub fn wick(&self) -> Option<f64> {
        match *self {
            WickSignal::Buy(price) | WickSignal::Sell(price) => Some(price),
            WickSignal::None => None,
        }
    }

    pub fn buy(&self) -> Option<f64> {
        match *self {
            WickSignal::Buy(price) => Some(price),
            _ => None,
        }
    }

    pub fn sell(&self) -> Option<f64> {
        match *self {
            WickSignal::Sell(price) => Some(price),
            _ => None,
        }
    }

    /// +1 for a buy wick, -1 for a sell wick, 0 otherwise.
    pub fn sign(&self) -> i8 {
        match self {
            WickSignal::Buy(_) => 1,
            WickSignal::Sell(_) => -1,
            WickSignal::None => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WickReversalSignal {
    params: WickParams,
}

impl WickReversalSignal {
    pub fn new(params: WickParams) -> Self {
        Self { params }
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::WickReversal {
            wick_multiplier_x100: scale_x100(self.params.wick_multiplier_min),
            close_percent_x100: scale_x100(self.params.close_percent_max),
        }
    }

    /// Judge a single bar. A buy wick takes precedence over a sell wick.
    pub fn evaluate(&self, bar: &OhlcvBar) -> WickSignal {
        let wick_range = bar.high - bar.low;
        let body_high = bar.body_high();
        let body_low = bar.body_low();
        let body_range = body_high - body_low;

        let min_wick = self.params.wick_multiplier_min * body_range;
        let wick_buy = (body_low - bar.low) >= min_wick;
        let wick_sell = (bar.high - body_high) >= min_wick;

        let divisor = if wick_range == 0.0 {
            ZERO_RANGE_SUBSTITUTE
        } else {
            wick_range
        };
        let close_percent = (bar.close - bar.low) / divisor;
        let close_buy = close_percent >= 1.0 - self.params.close_percent_max;
        let close_sell = close_percent <= self.params.close_percent_max;

        if wick_buy && close_buy {
            WickSignal::Buy(bar.low)
        } else if wick_sell && close_sell {
            WickSignal::Sell(bar.high)
        } else {
            WickSignal::None
        }
    }
}

pub fn calculate_wick_reversal(bars: &[OhlcvBar], params: WickParams) -> Vec<WickSignal> {
    let detector = WickReversalSignal::new(params);
    bars.iter().map(|bar| detector.evaluate(bar)).collect()
}
