//! Paper broker: simulated fills against the bar feed.
//!
//! Orders submitted while processing bar N are checked against bar N+1 and
//! later. Acknowledgements are queued and handed out by
//! [`BrokerPort::drain_notifications`].

use tracing::{debug, info};

use crate::domain::error::ScreenerError;
use crate::domain::execution::{apply_fill, apply_slippage, fill_price};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{OrderNotification, OrderRef, OrderRequest, OrderStatus};
use crate::domain::position::{ClosedTrade, Position};
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Default)]
pub struct PaperBroker {
    slippage_pct: f64,
    live: Vec<OrderRequest>,
    notifications: Vec<OrderNotification>,
    position: Option<Position>,
    closed_trades: Vec<ClosedTrade>,
    fill_count: usize,
}

impl PaperBroker {
    pub fn new(slippage_pct: f64) -> Self {
        Self {
            slippage_pct,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    pub fn live_orders(&self) -> &[OrderRequest] {
        &self.live
    }

    pub fn fill_count(&self) -> usize {
        self.fill_count
    }

    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades.iter().map(|t| t.pnl).sum()
    }
}

impl BrokerPort for PaperBroker {
    fn submit(&mut self, request: &OrderRequest) -> Result<(), ScreenerError> {
        if request.quantity == 0 {
            return Err(ScreenerError::Broker {
                reason: format!("order {} has zero quantity", request.order_ref),
            });
        }
        if self.live.iter().any(|o| o.order_ref == request.order_ref) {
            return Err(ScreenerError::Broker {
                reason: format!("order {} is already live", request.order_ref),
            });
        }

        debug!(
            order = %request.order_ref,
            role = ?request.role,
            side = ?request.side,
            kind = ?request.kind,
            quantity = request.quantity,
            "order accepted"
        );
        self.notifications
            .push(OrderNotification::new(request.order_ref, OrderStatus::Submitted));
        self.notifications
            .push(OrderNotification::new(request.order_ref, OrderStatus::Accepted));
        self.live.push(request.clone());
        Ok(())
    }

    fn cancel(&mut self, order_ref: OrderRef) -> Result<(), ScreenerError> {
        match self.live.iter().position(|o| o.order_ref == order_ref) {
            Some(index) => {
                self.live.remove(index);
                debug!(order = %order_ref, "order cancelled");
                self.notifications
                    .push(OrderNotification::new(order_ref, OrderStatus::Cancelled));
            }
            None => debug!(order = %order_ref, "cancel for unknown order ignored"),
        }
        Ok(())
    }

    fn on_bar(&mut self, bar: &OhlcvBar) -> Result<(), ScreenerError> {
        let mut resting = Vec::with_capacity(self.live.len());

        for request in std::mem::take(&mut self.live) {
            let Some(raw) = fill_price(&request, bar) else {
                resting.push(request);
                continue;
            };
            let price = apply_slippage(raw, request.side, self.slippage_pct);

            let result = apply_fill(
                self.position.take(),
                &bar.code,
                request.side,
                request.quantity,
                price,
                bar.date,
            );
            self.position = result.position;
            if let Some(trade) = result.closed {
                info!(
                    code = %trade.code,
                    entry = trade.entry_price,
                    exit = trade.exit_price,
                    pnl = trade.pnl,
                    "trade closed"
                );
                self.closed_trades.push(trade);
            }

            debug!(order = %request.order_ref, date = %bar.date, price, "order filled");
            self.fill_count += 1;
            self.notifications
                .push(OrderNotification::completed(request.order_ref, price));
        }

        self.live = resting;
        Ok(())
    }

    fn drain_notifications(&mut self) -> Vec<OrderNotification> {
        std::mem::take(&mut self.notifications)
    }
}
