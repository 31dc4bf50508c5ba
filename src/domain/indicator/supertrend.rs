//! Supertrend trend/stop indicator.
//!
//! hl2 is the midpoint of the highest high and lowest low over `period`;
//! the bands sit `factor` ATRs below (up) and above (down) it:
//!
//! - trend_up = max(up, last_trend_up) while the previous close holds above
//!   last_trend_up, else up (ratchets upward only)
//! - trend_down = min(down, last_trend_down) while the previous close holds
//!   below last_trend_down, else down (ratchets downward only)
//!
//! The trend turns +1 when the high (close without `use_wick`) pierces the
//! previous trend_down, -1 when the low (close) pierces the previous trend_up,
//! otherwise carries forward (+1 when there is nothing to carry).
//!
//! Warmup: the first `period` bars are invalid.

use crate::domain::indicator::{IndicatorType, scale_x100};
use crate::domain::indicator_helpers::{RollingWindow, WilderAtr};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendParams {
    pub factor: f64,
    pub period: usize,
    pub use_wick: bool,
}

impl Default for SupertrendParams {
    fn default() -> Self {
        Self {
            factor: 3.0,
            period: 7,
            use_wick: true,
        }
    }
}

/// State carried from bar to bar. All fields start invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SupertrendState {
    pub last_trend_up: Option<f64>,
    pub last_trend_down: Option<f64>,
    pub trend: Option<i8>,
    pub stop: Option<f64>,
}

/// One valid Supertrend output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendPoint {
    pub trend: i8,
    pub stop: f64,
    pub trend_up: f64,
    pub trend_down: f64,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    params: SupertrendParams,
    atr: WilderAtr,
    highs: RollingWindow,
    lows: RollingWindow,
    prev_close: Option<f64>,
    state: SupertrendState,
}

impl Supertrend {
    /// A zero `period` is raised to 1.
    pub fn new(params: SupertrendParams) -> Self {
        let params = SupertrendParams {
            period: params.period.max(1),
            ..params
        };
        Self {
            atr: WilderAtr::new(params.period),
            highs: RollingWindow::new(params.period),
            lows: RollingWindow::new(params.period),
            prev_close: None,
            state: SupertrendState::default(),
            params,
        }
    }

    pub fn state(&self) -> &SupertrendState {
        &self.state
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Supertrend {
            period: self.params.period,
            factor_x100: scale_x100(self.params.factor),
            use_wick: self.params.use_wick,
        }
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<SupertrendPoint> {
        let atr = self.atr.update(bar);
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        let prev_close = self.prev_close.replace(bar.close);

        let (Some(atr), Some(highest), Some(lowest), Some(prev_close)) =
            (atr, self.highs.highest(), self.lows.lowest(), prev_close)
        else {
            return None;
        };

        let hl2 = (highest + lowest) / 2.0;
        let up = hl2 - self.params.factor * atr;
        let down = hl2 + self.params.factor * atr;

        let last_up = self.state.last_trend_up;
        let last_down = self.state.last_trend_down;

        let trend_up = match last_up {
            Some(last) if prev_close > last => up.max(last),
            _ => up,
        };
        let trend_down = match last_down {
            Some(last) if prev_close < last => down.min(last),
            _ => down,
        };

        let (top, bottom) = if self.params.use_wick {
            (bar.high, bar.low)
        } else {
            (bar.close, bar.close)
        };

        let trend = if last_down.is_some_and(|d| top > d) {
            1
        } else if last_up.is_some_and(|u| bottom < u) {
            -1
        } else {
            self.state.trend.unwrap_or(1)
        };

        let stop = if trend == 1 { trend_up } else { trend_down };

        self.state = SupertrendState {
            last_trend_up: Some(trend_up),
            last_trend_down: Some(trend_down),
            trend: Some(trend),
            stop: Some(stop),
        };

        Some(SupertrendPoint {
            trend,
            stop,
            trend_up,
            trend_down,
        })
    }
}

/// Run a fresh Supertrend over a whole series.
pub fn calculate_supertrend(
    bars: &[OhlcvBar],
    params: SupertrendParams,
) -> Vec<Option<SupertrendPoint>> {
    let mut st = Supertrend::new(params);
    bars.iter().map(|bar| st.update(bar)).collect()
}
