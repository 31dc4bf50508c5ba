//! Integration tests for the trade driver against the paper broker.
//!
//! Tests cover:
//! - Scripted driver signals with real fills (entry, protect, re-peg, close)
//! - Full pipeline replay over generated history: one live order per role,
//!   driver state agreeing with the broker's position, determinism
//! - Entry gate variants for `max_entry_td` in {-1, 0, 4}
//! - Universe loading with partial failures

mod common;

use btscreener::adapters::paper_broker::PaperBroker;
use btscreener::domain::driver::{Action, BarSignals, BreakoutDriver, TradeState};
use btscreener::domain::gate::TdCountGate;
use btscreener::domain::order::{OrderKind, OrderRole, Side};
use btscreener::domain::pipeline::{SymbolPipeline, replay};
use btscreener::domain::strategy::ScreenerConfig;
use btscreener::domain::universe::{MIN_OHLCV_BARS, SkipReason, load_universe};
use btscreener::ports::broker_port::BrokerPort;
use common::*;

/// Drives a bare `BreakoutDriver` the way `replay` drives a pipeline, with
/// signals supplied by the test instead of indicators.
struct Harness {
    driver: BreakoutDriver,
    broker: PaperBroker,
    submitted: Vec<Action>,
}

impl Harness {
    fn new() -> Self {
        Self {
            driver: BreakoutDriver::new(10),
            broker: PaperBroker::new(0.0),
            submitted: Vec::new(),
        }
    }

    fn dispatch(&mut self, actions: Vec<Action>) {
        let mut pending = actions;
        loop {
            for action in pending.drain(..) {
                match &action {
                    Action::Submit(request) => self.broker.submit(request).unwrap(),
                    Action::Cancel(order_ref) => self.broker.cancel(*order_ref).unwrap(),
                }
                self.submitted.push(action);
            }
            let notes = self.broker.drain_notifications();
            if notes.is_empty() {
                return;
            }
            for n in notes {
                pending.extend(self.driver.on_notification(n));
            }
        }
    }

    fn step(&mut self, bar: &OhlcvBar, signals: BarSignals) {
        self.broker.on_bar(bar).unwrap();
        self.dispatch(Vec::new());
        let actions = self.driver.on_bar(signals);
        self.dispatch(actions);
    }

    fn state(&self) -> TradeState {
        *self.driver.state()
    }
}

fn signals(breakout: i8, close_signal: i8, protect_price: Option<f64>) -> BarSignals {
    BarSignals {
        breakout,
        close_signal,
        protect_price,
    }
}

mod scripted_driver {
    use super::*;

    #[test]
    fn breakout_entry_fills_and_gets_protected() {
        let mut h = Harness::new();

        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, Some(95.0)));
        assert_eq!(h.state().name(), "entry");
        assert_eq!(h.submitted.len(), 1);
        let Action::Submit(entry) = &h.submitted[0] else {
            panic!("expected entry submit");
        };
        assert_eq!(entry.side, Side::Buy);
        assert_eq!(entry.kind, OrderKind::Market);
        assert_eq!(entry.quantity, 10);

        // fills at the next open, then one protective stop goes out and is accepted
        h.step(&make_bar("BHP", 1, 101.0, 102.0, 100.0, 101.5), signals(0, 0, Some(95.0)));
        let position = h.broker.position().unwrap();
        assert_eq!(position.quantity, 10);
        assert!((position.entry_price - 101.0).abs() < f64::EPSILON);

        let stops: Vec<_> = h
            .broker
            .live_orders()
            .iter()
            .filter(|o| o.role == OrderRole::Protect)
            .collect();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].side, Side::Sell);
        assert_eq!(stops[0].stop_price(), Some(95.0));
        assert!(matches!(h.state(), TradeState::Protect { position: Side::Buy, .. }));
    }

    #[test]
    fn stop_out_on_gap_returns_to_idle() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, Some(95.0)));
        h.step(&make_bar("BHP", 1, 100.0, 101.0, 99.0, 100.0), signals(0, 0, Some(95.0)));

        h.step(&make_bar("BHP", 2, 90.0, 91.0, 88.0, 89.0), signals(0, 0, Some(95.0)));
        assert!(h.state().is_idle());
        assert!(h.broker.position().is_none());

        let trades = h.broker.closed_trades();
        assert_eq!(trades.len(), 1);
        assert!((trades[0].exit_price - 90.0).abs() < f64::EPSILON);
        assert!((trades[0].pnl + 100.0).abs() < 1e-9);
    }

    #[test]
    fn moving_stop_is_repegged() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, Some(95.0)));
        h.step(&make_bar("BHP", 1, 100.0, 101.0, 99.0, 100.0), signals(0, 0, Some(95.0)));
        h.step(&make_bar("BHP", 2, 100.0, 103.0, 99.5, 102.0), signals(0, 0, Some(97.0)));

        let live = h.broker.live_orders();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].stop_price(), Some(97.0));
        match h.state() {
            TradeState::Protect {
                protect,
                cancel_pending,
                ..
            } => {
                assert_eq!(protect.price, 97.0);
                assert_eq!(protect.order_ref, live[0].order_ref);
                assert!(!cancel_pending);
            }
            other => panic!("expected protect, got {other}"),
        }
        let cancels = h
            .submitted
            .iter()
            .filter(|a| matches!(a, Action::Cancel(_)))
            .count();
        assert_eq!(cancels, 1);
    }

    #[test]
    fn close_signal_flattens_at_next_open() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 50.0, 51.0, 49.0, 50.0), signals(-1, 0, Some(55.0)));
        h.step(&make_bar("BHP", 1, 50.0, 51.0, 49.0, 50.0), signals(0, 0, Some(55.0)));
        assert_eq!(h.broker.position().unwrap().quantity, -10);

        h.step(&make_bar("BHP", 2, 48.0, 49.0, 46.0, 47.0), signals(0, 1, Some(55.0)));
        assert!(matches!(h.state(), TradeState::Close { .. }));
        let live = h.broker.live_orders();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].role, OrderRole::Close);
        assert_eq!(live[0].side, Side::Buy);

        h.step(&make_bar("BHP", 3, 45.0, 46.0, 44.0, 45.0), signals(0, 0, Some(55.0)));
        assert!(h.state().is_idle());
        assert!(h.broker.position().is_none());
        assert!((h.broker.realized_pnl() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn unprotected_position_gets_stop_when_price_arrives() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, None));
        h.step(&make_bar("BHP", 1, 100.0, 101.0, 99.0, 100.0), signals(0, 0, None));
        assert!(matches!(h.state(), TradeState::StartProtect { protect: None, .. }));
        assert!(h.broker.live_orders().is_empty());

        h.step(&make_bar("BHP", 2, 100.0, 101.0, 99.0, 100.0), signals(0, 0, Some(96.0)));
        assert!(matches!(h.state(), TradeState::Protect { .. }));
        assert_eq!(h.broker.live_orders()[0].stop_price(), Some(96.0));
    }

    #[test]
    fn external_stop_cancels_unfilled_entry() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, Some(95.0)));

        let actions = h.driver.stop();
        h.dispatch(actions);
        assert!(h.state().is_idle());
        assert!(h.broker.live_orders().is_empty());

        h.step(&make_bar("BHP", 1, 104.0, 105.0, 103.0, 104.0), signals(0, 0, Some(95.0)));
        assert!(h.broker.position().is_none());
        assert_eq!(h.broker.fill_count(), 0);
    }

    #[test]
    fn external_stop_while_unprotected_flattens() {
        let mut h = Harness::new();
        h.step(&make_bar("BHP", 0, 100.0, 101.0, 99.0, 100.0), signals(1, 0, None));
        h.step(&make_bar("BHP", 1, 100.0, 101.0, 99.0, 100.0), signals(0, 0, None));

        let actions = h.driver.stop();
        h.dispatch(actions);
        assert!(matches!(h.state(), TradeState::Close { .. }));

        h.step(&make_bar("BHP", 2, 104.0, 105.0, 103.0, 104.0), signals(0, 0, None));
        assert!(h.state().is_idle());
        assert!((h.broker.realized_pnl() - 40.0).abs() < 1e-9);
    }
}

mod pipeline_replay {
    use super::*;

    fn config_with_gate(max_entry_td: i64) -> ScreenerConfig {
        ScreenerConfig {
            gate: TdCountGate::from_config(max_entry_td, false),
            ..ScreenerConfig::default()
        }
    }

    #[test]
    fn broker_and_driver_stay_consistent() {
        for seed in [1, 7, 42] {
            let bars = choppy_bars("SIM", 600, seed);
            let config = ScreenerConfig::default();
            let mut pipeline = SymbolPipeline::new("SIM", &config);
            let mut broker = PaperBroker::new(0.0);

            for bar in &bars {
                replay(&mut pipeline, &mut broker, std::slice::from_ref(bar)).unwrap();

                let live = broker.live_orders();
                for role in [OrderRole::Entry, OrderRole::Protect, OrderRole::Close] {
                    assert!(
                        live.iter().filter(|o| o.role == role).count() <= 1,
                        "seed {seed}: two live {role:?} orders on {}",
                        bar.date
                    );
                }

                let state = *pipeline.trade_state();
                match state {
                    TradeState::Idle | TradeState::Entry { .. } => {
                        assert!(
                            broker.position().is_none(),
                            "seed {seed}: {state} with a position"
                        );
                    }
                    TradeState::StartProtect { position, .. }
                    | TradeState::Protect { position, .. } => {
                        let held = broker.position().expect("position while protecting");
                        assert_eq!(held.quantity.signum(), i64::from(position.sign()));
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn replay_is_deterministic() {
        let bars = choppy_bars("SIM", 400, 3);
        let run = || {
            let mut pipeline = SymbolPipeline::new("SIM", &ScreenerConfig::default());
            let mut broker = PaperBroker::new(0.05);
            let snapshots = replay(&mut pipeline, &mut broker, &bars).unwrap();
            (snapshots, broker.closed_trades().to_vec())
        };
        assert_eq!(run(), run());
    }

    /// Bars on which the driver moved into `entry`.
    fn entry_bars(config: &ScreenerConfig, bars: &[OhlcvBar]) -> Vec<(i8, Option<i32>)> {
        let mut pipeline = SymbolPipeline::new("SIM", config);
        let mut broker = PaperBroker::new(0.0);
        let snapshots = replay(&mut pipeline, &mut broker, bars).unwrap();

        let mut entries = Vec::new();
        let mut prev_entry = false;
        for s in &snapshots {
            let is_entry = s.trade_state.is_some_and(|t| t.name() == "entry");
            if is_entry && !prev_entry {
                entries.push((s.breakout, s.td_count));
            }
            prev_entry = is_entry;
        }
        entries
    }

    #[test]
    fn entries_only_on_breakouts_that_pass_the_gate() {
        let bars = choppy_bars("SIM", 800, 11);

        let unbounded = entry_bars(&config_with_gate(-1), &bars);
        assert!(!unbounded.is_empty());
        assert!(unbounded.iter().all(|(b, _)| *b != 0));

        let zero = entry_bars(&config_with_gate(0), &bars);
        assert!(zero.iter().all(|(b, td)| *b != 0 && *td == Some(0)));

        let four = entry_bars(&config_with_gate(4), &bars);
        assert!(
            four.iter()
                .all(|(b, td)| *b != 0 && td.is_some_and(|c| c.abs() <= 4))
        );
        assert!(four.len() < unbounded.len());
    }

    #[test]
    fn zero_gate_takes_only_the_fresh_count_breakout() {
        let bars = double_breakout_bars("SIM");

        // unbounded takes the first breakout even though the count is extended
        let unbounded = entry_bars(&config_with_gate(-1), &bars);
        assert_eq!(unbounded.first(), Some(&(1, Some(9))));

        let zero = entry_bars(&config_with_gate(0), &bars);
        assert_eq!(zero, vec![(1, Some(0))]);

        let four = entry_bars(&config_with_gate(4), &bars);
        assert_eq!(four, vec![(1, Some(0))]);
    }

    #[test]
    fn scan_and_replay_agree_on_indicators() {
        let bars = choppy_bars("SIM", 300, 5);
        let config = ScreenerConfig::default();
        let scan = SymbolPipeline::new("SIM", &config).run_scan(&bars);

        let mut pipeline = SymbolPipeline::new("SIM", &config);
        let mut broker = PaperBroker::new(0.0);
        let replayed = replay(&mut pipeline, &mut broker, &bars).unwrap();

        assert_eq!(scan.len(), replayed.len());
        for (a, b) in scan.iter().zip(&replayed) {
            assert_eq!(a.trend, b.trend);
            assert_eq!(a.stop, b.stop);
            assert_eq!(a.support, b.support);
            assert_eq!(a.resistance, b.resistance);
            assert_eq!(a.breakout, b.breakout);
            assert_eq!(a.td_count, b.td_count);
            assert!(b.trade_state.is_some());
        }
    }
}

mod universe_loading {
    use super::*;

    #[test]
    fn partial_universe_skips_failures() {
        let port = MockDataPort::new()
            .with_bars("BHP", choppy_bars("BHP", 50, 1))
            .with_bars("NEW", choppy_bars("NEW", MIN_OHLCV_BARS - 1, 2))
            .with_error("BAD", "connection reset");
        let codes = vec!["BHP".to_string(), "NEW".into(), "BAD".into(), "GONE".into()];

        let result = load_universe(&port, &codes, day(0), day(1000), MIN_OHLCV_BARS).unwrap();

        assert_eq!(result.loaded.len(), 1);
        assert_eq!(result.loaded[0].code, "BHP");
        assert_eq!(result.skipped.len(), 3);
        assert!(result.skipped.iter().any(|s| s.code == "NEW"
            && s.reason == SkipReason::InsufficientBars { bars: MIN_OHLCV_BARS - 1 }));
    }

    #[test]
    fn date_range_limits_bars() {
        let port = MockDataPort::new().with_bars("BHP", choppy_bars("BHP", 100, 1));
        let codes = vec!["BHP".to_string()];

        let result = load_universe(&port, &codes, day(10), day(39), MIN_OHLCV_BARS).unwrap();
        assert_eq!(result.loaded[0].bars.len(), 30);
        assert_eq!(result.loaded[0].bars[0].date, day(10));
    }
}
