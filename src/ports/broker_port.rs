//! Broker port trait.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{OrderNotification, OrderRef, OrderRequest};

/// Order routing and acknowledgement source.
///
/// Submissions and cancels are fire-and-forget; the outcome arrives later as
/// [`OrderNotification`]s, which may be stale or out of order relative to the
/// caller's view.
pub trait BrokerPort {
    fn submit(&mut self, request: &OrderRequest) -> Result<(), ScreenerError>;

    fn cancel(&mut self, order_ref: OrderRef) -> Result<(), ScreenerError>;

    /// Advance the broker's view of the market by one bar.
    fn on_bar(&mut self, bar: &OhlcvBar) -> Result<(), ScreenerError>;

    fn drain_notifications(&mut self) -> Vec<OrderNotification>;
}
