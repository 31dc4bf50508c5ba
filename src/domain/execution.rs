//! Fill simulation for paper trading.
//!
//! Orders are checked against the bar that follows their submission:
//! market orders fill at that bar's open, stops fill once the bar trades
//! through their price. A bar that gaps past a stop fills at the open.

use chrono::NaiveDate;

use super::ohlcv::OhlcvBar;
use super::order::{OrderKind, OrderRequest, Side};
use super::position::{ClosedTrade, Position};

/// Buys pay up by `slippage_pct` percent, sells receive less.
pub fn apply_slippage(market_price: f64, side: Side, slippage_pct: f64) -> f64 {
    match side {
        Side::Buy => market_price * (1.0 + slippage_pct / 100.0),
        Side::Sell => market_price * (1.0 - slippage_pct / 100.0),
    }
}

/// Raw fill price for `request` on `bar`, or `None` if it does not trigger.
pub fn fill_price(request: &OrderRequest, bar: &OhlcvBar) -> Option<f64> {
    match (request.kind, request.side) {
        (OrderKind::Market, _) => Some(bar.open),
        (OrderKind::Stop { price }, Side::Sell) if bar.low <= price => Some(bar.open.min(price)),
        (OrderKind::Stop { price }, Side::Buy) if bar.high >= price => Some(bar.open.max(price)),
        (OrderKind::Stop { .. }, _) => None,
    }
}

/// Result of applying one fill to the net position for a code.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FillResult {
    pub position: Option<Position>,
    pub closed: Option<ClosedTrade>,
}

/// Net a fill into the existing position.
///
/// Same direction adds at the average price; the opposite direction closes,
/// and any excess opens a new position the other way.
pub fn apply_fill(
    position: Option<Position>,
    code: &str,
    side: Side,
    quantity: u32,
    price: f64,
    date: NaiveDate,
) -> FillResult {
    let signed = i64::from(side.sign()) * i64::from(quantity);

    let Some(current) = position else {
        return FillResult {
            position: (signed != 0).then(|| Position {
                code: code.to_string(),
                quantity: signed,
                entry_price: price,
                entry_date: date,
            }),
            closed: None,
        };
    };

    if current.quantity.signum() == signed.signum() {
        let total = current.quantity + signed;
        let cost = current.quantity as f64 * current.entry_price + signed as f64 * price;
        return FillResult {
            position: Some(Position {
                quantity: total,
                entry_price: cost / total as f64,
                ..current
            }),
            closed: None,
        };
    }

    let remaining = current.quantity + signed;
    if remaining.signum() == current.quantity.signum() {
        // partial reduce
        let closed_part = Position {
            quantity: -signed,
            ..current.clone()
        };
        return FillResult {
            position: Some(Position {
                quantity: remaining,
                ..current
            }),
            closed: Some(closed_part.close(price, date)),
        };
    }

    let closed = current.close(price, date);
    FillResult {
        position: (remaining != 0).then(|| Position {
            code: code.to_string(),
            quantity: remaining,
            entry_price: price,
            entry_date: date,
        }),
        closed: Some(closed),
    }
}
