//! Streaming indicator implementations.
//!
//! Every indicator is an explicit state struct with a per-bar `update` (or
//! `evaluate` for the stateless wick detector). Outputs are `Option`s: `None`
//! marks warm-up and must be checked before acting, it is never a numeric
//! default.
//!
//! - [`supertrend::Supertrend`]: ATR band trend and ratcheting stop
//! - [`wick_reversal::WickReversalSignal`]: single-bar reversal wick detector
//! - [`td_sequential::TdSequential`]: exhaustion bar count
//! - [`ad_breakout::AdBreakout`]: support/resistance zone and breakout edge

pub mod ad_breakout;
pub mod supertrend;
pub mod td_sequential;
pub mod wick_reversal;

use std::fmt;

/// Indicator identity plus parameters, used for labelling output.
///
/// Float parameters are stored scaled by 100 so the type stays `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Supertrend {
        period: usize,
        factor_x100: u32,
        use_wick: bool,
    },
    WickReversal {
        wick_multiplier_x100: u32,
        close_percent_x100: u32,
    },
    TdSequential,
    AdBreakout,
}

pub(crate) fn scale_x100(value: f64) -> u32 {
    (value * 100.0).round() as u32
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Supertrend {
                period,
                factor_x100,
                use_wick,
            } => {
                let factor = *factor_x100 as f64 / 100.0;
                let source = if *use_wick { "wick" } else { "close" };
                write!(f, "SUPERTREND({},{},{})", period, factor, source)
            }
            IndicatorType::WickReversal {
                wick_multiplier_x100,
                close_percent_x100,
            } => {
                let mult = *wick_multiplier_x100 as f64 / 100.0;
                let pct = *close_percent_x100 as f64 / 100.0;
                write!(f, "WICK({},{})", mult, pct)
            }
            IndicatorType::TdSequential => write!(f, "TD"),
            IndicatorType::AdBreakout => write!(f, "ADBREAKOUT"),
        }
    }
}
