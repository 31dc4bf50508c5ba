//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::domain::config_validation::{config_date, validate_screener_config};
use crate::domain::driver::TradeState;
use crate::domain::error::ScreenerError;
use crate::domain::gate::TdCountGate;
use crate::domain::indicator::ad_breakout::AdBreakout;
use crate::domain::indicator::supertrend::{Supertrend, SupertrendParams};
use crate::domain::indicator::td_sequential::TdSequential;
use crate::domain::indicator::wick_reversal::{WickParams, WickReversalSignal};
use crate::domain::pipeline::{SymbolPipeline, replay};
use crate::domain::position::{ClosedTrade, Position};
use crate::domain::strategy::ScreenerConfig;
use crate::domain::summary::{SummaryRow, classify_breakout, rank_rows, summarize};
use crate::domain::universe::{MIN_OHLCV_BARS, load_universe, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "btscreener", about = "Breakout screener and trade driver replay")]
pub struct Cli {
    /// Log indicator gating and driver transitions
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen codes on their latest bar
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, overriding [universe] codes
        #[arg(long)]
        code: Option<String>,
        /// Directory for per-code snapshots and summary.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay the trade driver over history against the paper broker
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List codes available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            code,
            output,
        } => run_scan(&config, code.as_deref(), output.as_deref()),
        Command::Replay {
            config,
            code,
            output,
        } => run_replay(&config, code.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_screener_config(&adapter)?;
    Ok(adapter)
}

/// Where bars come from and which slice of history to use.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn build_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, ScreenerError> {
    let path = config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ScreenerError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;

    Ok(DataSettings {
        path: PathBuf::from(path.trim()),
        start_date: config_date(config, "data", "start_date")?.unwrap_or(NaiveDate::MIN),
        end_date: config_date(config, "data", "end_date")?.unwrap_or(NaiveDate::MAX),
    })
}

pub fn build_screener_config(config: &dyn ConfigPort) -> Result<ScreenerConfig, ScreenerError> {
    let defaults = ScreenerConfig::default();

    let period = config.get_int("supertrend", "period", defaults.supertrend.period as i64);
    let period = usize::try_from(period).map_err(|_| ScreenerError::ConfigInvalid {
        section: "supertrend".into(),
        key: "period".into(),
        reason: "period must be at least 1".into(),
    })?;

    let order_size = config.get_int("driver", "order_size", i64::from(defaults.order_size));
    let order_size = u32::try_from(order_size).map_err(|_| ScreenerError::ConfigInvalid {
        section: "driver".into(),
        key: "order_size".into(),
        reason: "order_size must be a positive integer".into(),
    })?;

    Ok(ScreenerConfig {
        supertrend: SupertrendParams {
            factor: config.get_double("supertrend", "factor", defaults.supertrend.factor),
            period,
            use_wick: config.get_bool("supertrend", "use_wick", defaults.supertrend.use_wick),
        },
        wick: WickParams {
            wick_multiplier_min: config.get_double(
                "wick",
                "wick_multiplier_min",
                defaults.wick.wick_multiplier_min,
            ),
            close_percent_max: config.get_double(
                "wick",
                "close_percent_max",
                defaults.wick.close_percent_max,
            ),
        },
        gate: TdCountGate::from_config(
            config.get_int("driver", "max_entry_td", -1),
            config.get_bool("driver", "require_td_agreement", false),
        ),
        order_size,
        slippage_pct: config.get_double("broker", "slippage_pct", defaults.slippage_pct),
    })
}

/// `--code` wins over `[universe] codes`; both accept comma-separated lists.
/// An empty result means "everything the feed has".
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, ScreenerError> {
    if let Some(codes) = code_override {
        return Ok(parse_codes(codes)?);
    }

    match config.get_string("universe", "codes") {
        Some(codes) if !codes.trim().is_empty() => Ok(parse_codes(&codes)?),
        _ => Ok(Vec::new()),
    }
}

fn codes_or_all(
    codes: Vec<String>,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ScreenerError> {
    if !codes.is_empty() {
        return Ok(codes);
    }
    let all = data_port.list_symbols()?;
    if all.is_empty() {
        return Err(ScreenerError::DataFeed {
            reason: "no codes configured and none found in the data directory".into(),
        });
    }
    info!(count = all.len(), "no codes configured, using every code in the feed");
    Ok(all)
}

/// Scan every code and return the screener rows, ranked.
pub fn scan_codes(
    data_port: &dyn DataPort,
    mut report: Option<&mut dyn ReportPort>,
    config: &ScreenerConfig,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<SummaryRow>, ScreenerError> {
    let universe = load_universe(data_port, codes, start_date, end_date, MIN_OHLCV_BARS)?;
    let mut rows = Vec::with_capacity(universe.loaded.len());

    for loaded in &universe.loaded {
        let mut pipeline = SymbolPipeline::new(&loaded.code, config);
        let snapshots = pipeline.run_scan(&loaded.bars);

        if let Some(report) = report.as_mut() {
            report.write_snapshots(&loaded.code, &snapshots)?;
        }
        if let Some(row) = summarize(&loaded.code, &snapshots) {
            rows.push(row);
        }
    }

    rank_rows(&mut rows);
    if let Some(report) = report.as_mut() {
        report.write_summaries(&rows)?;
    }

    info!(
        scanned = rows.len(),
        skipped = universe.skipped.len(),
        "scan finished"
    );
    Ok(rows)
}

/// Outcome of replaying one code.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub code: String,
    pub final_state: TradeState,
    pub last_close: f64,
    pub position: Option<Position>,
    pub trades: Vec<ClosedTrade>,
    pub fills: usize,
}

impl ReplayResult {
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.position
            .as_ref()
            .map_or(0.0, |p| p.unrealized_pnl(self.last_close))
    }
}

/// Replay the driver over each code's history, one paper broker per code.
pub fn replay_codes(
    data_port: &dyn DataPort,
    mut report: Option<&mut dyn ReportPort>,
    config: &ScreenerConfig,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<ReplayResult>, ScreenerError> {
    let universe = load_universe(data_port, codes, start_date, end_date, MIN_OHLCV_BARS)?;
    let mut results = Vec::with_capacity(universe.loaded.len());

    for loaded in &universe.loaded {
        let mut pipeline = SymbolPipeline::new(&loaded.code, config);
        let mut broker = PaperBroker::new(config.slippage_pct);
        let snapshots = replay(&mut pipeline, &mut broker, &loaded.bars)?;

        if let Some(report) = report.as_mut() {
            report.write_snapshots(&loaded.code, &snapshots)?;
        }

        if !broker.live_orders().is_empty() {
            warn!(
                code = %loaded.code,
                live = broker.live_orders().len(),
                "orders still working at end of history"
            );
        }

        results.push(ReplayResult {
            code: loaded.code.clone(),
            final_state: *pipeline.trade_state(),
            last_close: snapshots.last().map_or(0.0, |s| s.close),
            position: broker.position().cloned(),
            trades: broker.closed_trades().to_vec(),
            fills: broker.fill_count(),
        });
    }

    Ok(results)
}

fn open_report(output: Option<&Path>) -> Option<CsvReportAdapter> {
    output.map(CsvReportAdapter::new)
}

fn run_scan(
    config_path: &Path,
    code_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let screener = build_screener_config(&config)?;
    let data = build_data_settings(&config)?;
    let data_port = CsvAdapter::new(data.path.clone());
    let codes = codes_or_all(resolve_codes(code_override, &config)?, &data_port)?;

    eprintln!("Scanning {} codes...", codes.len());
    let mut report = open_report(output);
    let rows = scan_codes(
        &data_port,
        report.as_mut().map(|r| r as &mut dyn ReportPort),
        &screener,
        &codes,
        data.start_date,
        data.end_date,
    )?;

    println!(
        "{:<8} {:<10} {:>10} {:<20} {:<12} alert",
        "code", "date", "close", "trend", "td"
    );
    for row in &rows {
        println!(
            "{:<8} {:<10} {:>10.2} {:<20} {:<12} {}",
            row.code,
            row.date,
            row.close,
            row.trend_events().join(" "),
            row.td_events().join(" "),
            classify_breakout(row).map(|a| a.to_string()).unwrap_or_default(),
        );
    }

    let alerts = rows.iter().filter(|r| classify_breakout(r).is_some()).count();
    eprintln!("\n{} codes scanned, {} breakout alerts", rows.len(), alerts);
    if let Some(report) = &report {
        eprintln!("Report written to: {}", report.output_dir().display());
    }
    Ok(())
}

fn run_replay(
    config_path: &Path,
    code_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let screener = build_screener_config(&config)?;
    let data = build_data_settings(&config)?;
    let data_port = CsvAdapter::new(data.path.clone());
    let codes = codes_or_all(resolve_codes(code_override, &config)?, &data_port)?;

    eprintln!("Replaying {} codes...", codes.len());
    let mut report = open_report(output);
    let results = replay_codes(
        &data_port,
        report.as_mut().map(|r| r as &mut dyn ReportPort),
        &screener,
        &codes,
        data.start_date,
        data.end_date,
    )?;

    let mut total = 0.0;
    for result in &results {
        println!("=== {} ===", result.code);
        for trade in &result.trades {
            let direction = if trade.quantity > 0 { "long" } else { "short" };
            println!(
                "  {} {} -> {} {:>6} {:>10.2} -> {:>10.2}  pnl {:>+10.2}",
                direction,
                trade.entry_date,
                trade.exit_date,
                trade.quantity.abs(),
                trade.entry_price,
                trade.exit_price,
                trade.pnl,
            );
        }
        if let Some(position) = &result.position {
            println!(
                "  open {} @ {:.2}, unrealized {:+.2}",
                position.quantity,
                position.entry_price,
                result.unrealized_pnl(),
            );
        }
        let wins = result.trades.iter().filter(|t| t.is_win()).count();
        println!(
            "  state {}, {} fills, {} trades ({} wins), realized {:+.2}",
            result.final_state,
            result.fills,
            result.trades.len(),
            wins,
            result.realized_pnl(),
        );
        total += result.realized_pnl();
    }

    eprintln!("\n{} codes replayed, total realized {:+.2}", results.len(), total);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let screener = build_screener_config(&config)?;
    let data = build_data_settings(&config)?;
    let codes = resolve_codes(None, &config)?;

    let indicators = [
        Supertrend::new(screener.supertrend).indicator_type(),
        WickReversalSignal::new(screener.wick).indicator_type(),
        TdSequential::new().indicator_type(),
        AdBreakout::new().indicator_type(),
    ];
    eprintln!("\nIndicators:");
    for indicator in &indicators {
        eprintln!("  {indicator}");
    }

    match screener.gate.max_abs_count {
        Some(max) => eprintln!("Entry gate: |td count| <= {max}"),
        None => eprintln!("Entry gate: unbounded"),
    }
    if screener.gate.require_agreement {
        eprintln!("            td count must agree with breakout");
    }
    eprintln!("Order size: {}", screener.order_size);
    eprintln!("Data:       {}", data.path.display());
    if codes.is_empty() {
        eprintln!("Universe:   every code in the data directory");
    } else {
        eprintln!("Universe:   {}", codes.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let data = build_data_settings(&config)?;
    let symbols = CsvAdapter::new(data.path).list_symbols()?;

    for symbol in &symbols {
        println!("{symbol}");
    }
    eprintln!("{} symbols found", symbols.len());
    Ok(())
}
