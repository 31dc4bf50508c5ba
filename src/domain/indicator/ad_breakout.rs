//! Accumulation/distribution breakout.
//!
//! Combines a trend source (trend sign plus stop) with a reversal pattern
//! source into a support/resistance zone:
//!
//! - uptrend: support follows the stop; resistance is the highest high of
//!   distribution bars (sell wicks) seen since the trend turned up
//! - downtrend: resistance follows the stop; support is the lowest low of
//!   accumulation bars (buy wicks) seen since the trend turned down
//!
//! The level built from wicks is dropped on a trend flip and stays invalid
//! until the next qualifying wick. A breakout is the single bar on which the
//! close leaves a zone that contained the previous close.

use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::supertrend::{Supertrend, SupertrendState};
use crate::domain::indicator::wick_reversal::WickSignal;
use crate::domain::ohlcv::OhlcvBar;

/// Anything that reports a trend sign and a stop level.
pub trait TrendSource {
    fn trend(&self) -> Option<i8>;
    fn stop(&self) -> Option<f64>;
}

/// Anything that reports a signed reversal: +1 bullish, -1 bearish, 0 none.
pub trait ReversalSource {
    fn reversal_sign(&self) -> i8;
}

impl TrendSource for SupertrendState {
    fn trend(&self) -> Option<i8> {
        self.trend
    }

    fn stop(&self) -> Option<f64> {
        self.stop
    }
}

impl TrendSource for Supertrend {
    fn trend(&self) -> Option<i8> {
        self.state().trend
    }

    fn stop(&self) -> Option<f64> {
        self.state().stop
    }
}

impl ReversalSource for WickSignal {
    fn reversal_sign(&self) -> i8 {
        self.sign()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BreakoutPoint {
    pub trend: Option<i8>,
    /// Trend source stop, passed through as the protect price.
    pub stop: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub distribution: bool,
    pub accumulation: bool,
    pub breakout: i8,
}

#[derive(Debug, Clone, Default)]
pub struct AdBreakout {
    prev_trend: Option<i8>,
    prev_close: Option<f64>,
    support: Option<f64>,
    resistance: Option<f64>,
}

impl AdBreakout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::AdBreakout
    }

    /// Step one bar. `trend` and `pattern` must already reflect `bar`.
    pub fn update<T, R>(&mut self, bar: &OhlcvBar, trend: &T, pattern: &R) -> BreakoutPoint
    where
        T: TrendSource + ?Sized,
        R: ReversalSource + ?Sized,
    {
        let prev_support = self.support;
        let prev_resistance = self.resistance;
        let prev_close = self.prev_close.replace(bar.close);

        let current_trend = trend.trend();
        let stop = trend.stop();
        let wick = pattern.reversal_sign();

        let distribution = current_trend.is_some_and(|t| t > 0) && wick < 0;
        let accumulation = current_trend.is_some_and(|t| t < 0) && wick > 0;

        match current_trend {
            Some(t) if t > 0 => {
                self.support = stop;
                self.resistance = if distribution {
                    Some(prev_resistance.map_or(bar.high, |r| r.max(bar.high)))
                } else if self.prev_trend.is_none_or(|p| p <= 0) {
                    None
                } else {
                    prev_resistance
                };
            }
            Some(t) if t < 0 => {
                self.resistance = stop;
                self.support = if accumulation {
                    Some(prev_support.map_or(bar.low, |s| s.min(bar.low)))
                } else if self.prev_trend.is_none_or(|p| p >= 0) {
                    None
                } else {
                    prev_support
                };
            }
            _ => {
                self.support = None;
                self.resistance = None;
            }
        }
        self.prev_trend = current_trend;

        let was_in_zone = match (prev_close, prev_support, prev_resistance) {
            (Some(close), Some(support), Some(resistance)) => close < resistance && close > support,
            _ => false,
        };

        let breakout = if was_in_zone && self.resistance.is_some_and(|r| bar.close > r) {
            1
        } else if was_in_zone && self.support.is_some_and(|s| bar.close < s) {
            -1
        } else {
            0
        };

        BreakoutPoint {
            trend: current_trend,
            stop,
            support: self.support,
            resistance: self.resistance,
            distribution,
            accumulation,
            breakout,
        }
    }
}
