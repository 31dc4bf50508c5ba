//! Breakout trade lifecycle.
//!
//! One position at a time: enter on a breakout with a market order, guard it
//! with a stop at the trend stop, re-peg the stop as the level moves, and
//! flatten on an exhaustion reversal.
//!
//! [`transition`] is a pure function of (state, event, context). Each state
//! variant carries the single order it is waiting on, so a second live order
//! for the same role cannot be represented. Notifications are matched on
//! [`OrderRef`]; anything that does not match the tracked order, or any event
//! the current state has no rule for, is ignored.

use std::fmt;

use tracing::{debug, warn};

use crate::domain::order::{
    OrderKind, OrderNotification, OrderRef, OrderRequest, OrderRole, OrderStatus, Side,
};

/// A working protective stop and the price it was sent at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectOrder {
    pub order_ref: OrderRef,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TradeState {
    #[default]
    Idle,
    /// Entry market order sent; `side` is the side of the intended position.
    Entry { entry: OrderRef, side: Side },
    CancelEntry { entry: OrderRef, side: Side },
    /// Position open, protective stop sent but not yet accepted. `protect` is
    /// `None` while no valid stop price has been available.
    StartProtect {
        position: Side,
        protect: Option<ProtectOrder>,
    },
    /// Stop accepted and working. `cancel_pending` is set while a re-peg
    /// cancel is in flight.
    Protect {
        position: Side,
        protect: ProtectOrder,
        cancel_pending: bool,
    },
    CancelProtect {
        position: Side,
        protect: ProtectOrder,
    },
    Close { close: OrderRef },
}

impl TradeState {
    pub fn name(&self) -> &'static str {
        match self {
            TradeState::Idle => "idle",
            TradeState::Entry { .. } => "entry",
            TradeState::CancelEntry { .. } => "cancel_entry",
            TradeState::StartProtect { .. } => "start_protect",
            TradeState::Protect { .. } => "protect",
            TradeState::CancelProtect { .. } => "cancel_protect",
            TradeState::Close { .. } => "close",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TradeState::Idle)
    }

    /// Side of the open (or opening) position, if any.
    pub fn position(&self) -> Option<Side> {
        match *self {
            TradeState::Idle | TradeState::Close { .. } => None,
            TradeState::Entry { side, .. } | TradeState::CancelEntry { side, .. } => Some(side),
            TradeState::StartProtect { position, .. }
            | TradeState::Protect { position, .. }
            | TradeState::CancelProtect { position, .. } => Some(position),
        }
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-bar inputs, already gated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarSignals {
    /// Entry edge: +1 long, -1 short, 0 none.
    pub breakout: i8,
    /// Exhaustion reversal; nonzero asks to flatten.
    pub close_signal: i8,
    pub protect_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Bar(BarSignals),
    Notify(OrderNotification),
    /// External request to stop trading this symbol.
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(OrderRequest),
    Cancel(OrderRef),
}

/// Inputs the transition needs besides the state and the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverContext {
    pub order_size: u32,
    /// Handle to use if this transition submits an order.
    pub next_ref: OrderRef,
    /// Latest known stop level; used when a notification triggers a resend.
    pub protect_price: Option<f64>,
}

impl DriverContext {
    pub fn new(order_size: u32) -> Self {
        Self {
            order_size,
            next_ref: OrderRef(1),
            protect_price: None,
        }
    }

    fn market(&self, role: OrderRole, side: Side) -> OrderRequest {
        OrderRequest {
            order_ref: self.next_ref,
            role,
            side,
            kind: OrderKind::Market,
            quantity: self.order_size,
        }
    }

    fn stop(&self, side: Side, price: f64) -> OrderRequest {
        OrderRequest {
            order_ref: self.next_ref,
            role: OrderRole::Protect,
            side,
            kind: OrderKind::Stop { price },
            quantity: self.order_size,
        }
    }
}

fn matches(n: &OrderNotification, order: OrderRef, status: OrderStatus) -> bool {
    n.order_ref == order && n.status == status
}

/// Send a protective stop for `position` if a stop price is known.
fn start_protect(
    position: Side,
    price: Option<f64>,
    ctx: &DriverContext,
) -> (TradeState, Vec<Action>) {
    match price {
        Some(price) => {
            let request = ctx.stop(position.opposite(), price);
            let protect = ProtectOrder {
                order_ref: request.order_ref,
                price,
            };
            (
                TradeState::StartProtect {
                    position,
                    protect: Some(protect),
                },
                vec![Action::Submit(request)],
            )
        }
        None => {
            warn!(?position, "no valid protect price, position left unprotected");
            (
                TradeState::StartProtect {
                    position,
                    protect: None,
                },
                Vec::new(),
            )
        }
    }
}

fn close_position(position: Side, ctx: &DriverContext) -> (TradeState, Vec<Action>) {
    let request = ctx.market(OrderRole::Close, position.opposite());
    (
        TradeState::Close {
            close: request.order_ref,
        },
        vec![Action::Submit(request)],
    )
}

/// Compute the next state and the side effects for one event.
///
/// Returns the unchanged state and no actions when no rule applies. At most
/// one `Submit` is ever returned, always using `ctx.next_ref`.
pub fn transition(
    state: &TradeState,
    event: &DriverEvent,
    ctx: &DriverContext,
) -> (TradeState, Vec<Action>) {
    use DriverEvent::{Bar, Notify, Stop};
    use OrderStatus::{Accepted, Cancelled, Completed};

    match (*state, event) {
        (TradeState::Idle, Bar(signals)) if signals.breakout != 0 => {
            let side = if signals.breakout > 0 { Side::Buy } else { Side::Sell };
            let request = ctx.market(OrderRole::Entry, side);
            (
                TradeState::Entry {
                    entry: request.order_ref,
                    side,
                },
                vec![Action::Submit(request)],
            )
        }

        (TradeState::Entry { entry, side }, Notify(n)) if matches(n, entry, Completed) => {
            start_protect(side, ctx.protect_price, ctx)
        }
        (TradeState::Entry { entry, side }, Stop) => {
            (TradeState::CancelEntry { entry, side }, vec![Action::Cancel(entry)])
        }

        (TradeState::CancelEntry { entry, .. }, Notify(n)) if matches(n, entry, Cancelled) => {
            (TradeState::Idle, Vec::new())
        }

        (
            TradeState::StartProtect {
                protect: Some(protect),
                ..
            },
            Notify(n),
        ) if matches(n, protect.order_ref, Completed) => (TradeState::Idle, Vec::new()),
        (
            TradeState::StartProtect {
                position,
                protect: Some(protect),
            },
            Notify(n),
        ) if matches(n, protect.order_ref, Accepted) => (
            TradeState::Protect {
                position,
                protect,
                cancel_pending: false,
            },
            Vec::new(),
        ),
        (
            TradeState::StartProtect {
                position,
                protect: Some(protect),
            },
            Stop,
        ) => (
            TradeState::CancelProtect { position, protect },
            vec![Action::Cancel(protect.order_ref)],
        ),
        // nothing working to cancel: flatten directly
        (
            TradeState::StartProtect {
                position,
                protect: None,
            },
            Stop,
        ) => close_position(position, ctx),
        (
            TradeState::StartProtect {
                position,
                protect: None,
            },
            Bar(signals),
        ) => {
            if signals.close_signal != 0 {
                close_position(position, ctx)
            } else if signals.protect_price.is_some() {
                start_protect(position, signals.protect_price, ctx)
            } else {
                (*state, Vec::new())
            }
        }

        (TradeState::Protect { position, protect, .. }, Notify(n))
            if matches(n, protect.order_ref, Cancelled) =>
        {
            start_protect(position, ctx.protect_price, ctx)
        }
        (TradeState::Protect { protect, .. }, Notify(n))
            if matches(n, protect.order_ref, Completed) =>
        {
            (TradeState::Idle, Vec::new())
        }
        (
            TradeState::Protect {
                position,
                protect,
                cancel_pending,
            },
            Bar(signals),
        ) => {
            if signals.close_signal != 0 {
                let actions = if cancel_pending {
                    Vec::new()
                } else {
                    vec![Action::Cancel(protect.order_ref)]
                };
                (TradeState::CancelProtect { position, protect }, actions)
            } else if !cancel_pending
                && signals.protect_price.is_some_and(|p| p != protect.price)
            {
                (
                    TradeState::Protect {
                        position,
                        protect,
                        cancel_pending: true,
                    },
                    vec![Action::Cancel(protect.order_ref)],
                )
            } else {
                (*state, Vec::new())
            }
        }

        (TradeState::CancelProtect { position, protect }, Notify(n))
            if matches(n, protect.order_ref, Cancelled) =>
        {
            close_position(position, ctx)
        }
        (TradeState::CancelProtect { protect, .. }, Notify(n))
            if matches(n, protect.order_ref, Completed) =>
        {
            (TradeState::Idle, Vec::new())
        }

        (TradeState::Close { close }, Notify(n)) if matches(n, close, Completed) => {
            (TradeState::Idle, Vec::new())
        }

        _ => (*state, Vec::new()),
    }
}

/// Owns the trade state and context for one symbol and mints order refs.
#[derive(Debug, Clone)]
pub struct BreakoutDriver {
    state: TradeState,
    ctx: DriverContext,
}

impl BreakoutDriver {
    pub fn new(order_size: u32) -> Self {
        Self {
            state: TradeState::Idle,
            ctx: DriverContext::new(order_size),
        }
    }

    pub fn state(&self) -> &TradeState {
        &self.state
    }

    pub fn on_bar(&mut self, signals: BarSignals) -> Vec<Action> {
        self.ctx.protect_price = signals.protect_price;
        self.apply(DriverEvent::Bar(signals))
    }

    pub fn on_notification(&mut self, notification: OrderNotification) -> Vec<Action> {
        self.apply(DriverEvent::Notify(notification))
    }

    pub fn stop(&mut self) -> Vec<Action> {
        self.apply(DriverEvent::Stop)
    }

    fn apply(&mut self, event: DriverEvent) -> Vec<Action> {
        let (next, actions) = transition(&self.state, &event, &self.ctx);

        if actions.iter().any(|a| matches!(a, Action::Submit(_))) {
            self.ctx.next_ref = OrderRef(self.ctx.next_ref.0 + 1);
        }

        if next != self.state {
            debug!(from = %self.state, to = %next, ?event, "trade state transition");
        } else if actions.is_empty() && !matches!(event, DriverEvent::Bar(_)) {
            debug!(state = %self.state, ?event, "event ignored");
        }

        self.state = next;
        actions
    }
}
