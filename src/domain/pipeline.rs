//! Per-symbol pipeline: owns every indicator, the entry gate and the driver
//! for one code and steps them in dependency order on each bar.
//!
//! Supertrend, wick and TD first, then ADBreakout over the first two, then
//! the gated driver over ADBreakout and TD.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::driver::{Action, BarSignals, BreakoutDriver, TradeState};
use crate::domain::error::ScreenerError;
use crate::domain::gate::EntryGate;
use crate::domain::indicator::ad_breakout::{AdBreakout, BreakoutPoint};
use crate::domain::indicator::supertrend::Supertrend;
use crate::domain::indicator::td_sequential::{TdPoint, TdSequential};
use crate::domain::indicator::wick_reversal::{WickReversalSignal, WickSignal};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::OrderNotification;
use crate::domain::strategy::ScreenerConfig;
use crate::ports::broker_port::BrokerPort;

/// Read-only view of one bar's indicator outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub trend: Option<i8>,
    pub stop: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub breakout: i8,
    pub wick: WickSignal,
    pub td_count: Option<i32>,
    pub td_reversal: Option<i8>,
    /// Driver state after the bar; `None` when only scanning.
    pub trade_state: Option<TradeState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarOutcome {
    pub snapshot: Snapshot,
    pub actions: Vec<Action>,
}

pub struct SymbolPipeline {
    code: String,
    supertrend: Supertrend,
    wick: WickReversalSignal,
    td: TdSequential,
    breakout: AdBreakout,
    gate: Box<dyn EntryGate>,
    driver: BreakoutDriver,
}

impl SymbolPipeline {
    /// Pipeline gated by the config's TD count gate.
    pub fn new(code: impl Into<String>, config: &ScreenerConfig) -> Self {
        Self::with_gate(code, config, Box::new(config.gate))
    }

    pub fn with_gate(
        code: impl Into<String>,
        config: &ScreenerConfig,
        gate: Box<dyn EntryGate>,
    ) -> Self {
        Self {
            code: code.into(),
            supertrend: Supertrend::new(config.supertrend),
            wick: WickReversalSignal::new(config.wick),
            td: TdSequential::new(),
            breakout: AdBreakout::new(),
            gate,
            driver: BreakoutDriver::new(config.order_size),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn trade_state(&self) -> &TradeState {
        self.driver.state()
    }

    fn step_indicators(&mut self, bar: &OhlcvBar) -> (BreakoutPoint, WickSignal, Option<TdPoint>) {
        self.supertrend.update(bar);
        let wick = self.wick.evaluate(bar);
        let td = self.td.update(bar);
        let point = self.breakout.update(bar, &self.supertrend, &wick);
        (point, wick, td)
    }

    fn snapshot(
        bar: &OhlcvBar,
        point: &BreakoutPoint,
        wick: WickSignal,
        td: Option<TdPoint>,
        trade_state: Option<TradeState>,
    ) -> Snapshot {
        Snapshot {
            date: bar.date,
            close: bar.close,
            trend: point.trend,
            stop: point.stop,
            support: point.support,
            resistance: point.resistance,
            breakout: point.breakout,
            wick,
            td_count: td.map(|t| t.count),
            td_reversal: td.map(|t| t.reversal),
            trade_state,
        }
    }

    pub fn on_bar(&mut self, bar: &OhlcvBar) -> BarOutcome {
        let (point, wick, td) = self.step_indicators(bar);
        let td_count = td.map(|t| t.count);

        let breakout = if point.breakout != 0 && !self.gate.allows(point.breakout, td_count) {
            debug!(
                code = %self.code,
                date = %bar.date,
                breakout = point.breakout,
                ?td_count,
                "entry gated"
            );
            0
        } else {
            point.breakout
        };

        let actions = self.driver.on_bar(BarSignals {
            breakout,
            close_signal: td.map_or(0, |t| t.reversal),
            protect_price: point.stop,
        });

        BarOutcome {
            snapshot: Self::snapshot(bar, &point, wick, td, Some(*self.driver.state())),
            actions,
        }
    }

    pub fn on_notification(&mut self, notification: OrderNotification) -> Vec<Action> {
        self.driver.on_notification(notification)
    }

    pub fn stop(&mut self) -> Vec<Action> {
        self.driver.stop()
    }

    /// Indicators only; the driver is not consulted.
    pub fn run_scan(&mut self, bars: &[OhlcvBar]) -> Vec<Snapshot> {
        bars.iter()
            .map(|bar| {
                let (point, wick, td) = self.step_indicators(bar);
                Self::snapshot(bar, &point, wick, td, None)
            })
            .collect()
    }
}

/// Send actions to the broker and feed its acknowledgements back until it
/// has nothing more to say.
fn dispatch(
    pipeline: &mut SymbolPipeline,
    broker: &mut dyn BrokerPort,
    actions: Vec<Action>,
) -> Result<(), ScreenerError> {
    let mut pending = actions;
    loop {
        for action in pending.drain(..) {
            match action {
                Action::Submit(request) => broker.submit(&request)?,
                Action::Cancel(order_ref) => broker.cancel(order_ref)?,
            }
        }

        let notifications = broker.drain_notifications();
        if notifications.is_empty() {
            return Ok(());
        }
        for notification in notifications {
            pending.extend(pipeline.on_notification(notification));
        }
    }
}

/// Replay a bar history through the pipeline against a broker.
///
/// For each bar the broker moves first (fills against the bar), its
/// notifications reach the driver, then the bar's signals are applied.
pub fn replay(
    pipeline: &mut SymbolPipeline,
    broker: &mut dyn BrokerPort,
    bars: &[OhlcvBar],
) -> Result<Vec<Snapshot>, ScreenerError> {
    let mut snapshots = Vec::with_capacity(bars.len());

    for bar in bars {
        broker.on_bar(bar)?;
        dispatch(pipeline, broker, Vec::new())?;

        let outcome = pipeline.on_bar(bar);
        dispatch(pipeline, broker, outcome.actions)?;

        let mut snapshot = outcome.snapshot;
        snapshot.trade_state = Some(*pipeline.trade_state());
        snapshots.push(snapshot);
    }

    info!(
        code = %pipeline.code(),
        bars = bars.len(),
        state = %pipeline.trade_state(),
        "replay finished"
    );
    Ok(snapshots)
}
