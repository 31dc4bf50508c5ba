//! Order intents and broker acknowledgements exchanged with the broker port.

use std::fmt;

/// Opaque handle for one submitted order.
///
/// Minted by the driver when it decides to submit; the broker echoes it back
/// in every notification for that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderRef(pub u64);

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buy, -1 for sell.
    pub fn sign(self) -> i8 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

/// Which slot of the driver an order occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRole {
    Entry,
    Protect,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderKind {
    Market,
    Stop { price: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub order_ref: OrderRef,
    pub role: OrderRole,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: u32,
}

impl OrderRequest {
    pub fn stop_price(&self) -> Option<f64> {
        match self.kind {
            OrderKind::Stop { price } => Some(price),
            OrderKind::Market => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub order_ref: OrderRef,
    pub status: OrderStatus,
    pub fill_price: Option<f64>,
}

impl OrderNotification {
    pub fn new(order_ref: OrderRef, status: OrderStatus) -> Self {
        Self {
            order_ref,
            status,
            fill_price: None,
        }
    }

    pub fn completed(order_ref: OrderRef, fill_price: f64) -> Self {
        Self {
            order_ref,
            status: OrderStatus::Completed,
            fill_price: Some(fill_price),
        }
    }
}
