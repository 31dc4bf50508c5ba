//! Screener configuration: indicator parameters plus driver policy.

use crate::domain::gate::TdCountGate;
use crate::domain::indicator::supertrend::SupertrendParams;
use crate::domain::indicator::wick_reversal::WickParams;

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerConfig {
    pub supertrend: SupertrendParams,
    pub wick: WickParams,
    pub gate: TdCountGate,
    pub order_size: u32,
    /// Percent applied against the trader on every paper fill.
    pub slippage_pct: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            supertrend: SupertrendParams::default(),
            wick: WickParams::default(),
            gate: TdCountGate::default(),
            order_size: 1,
            slippage_pct: 0.0,
        }
    }
}
