//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::csv_signal_store::CsvSignalStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{ExitReason, SimulationConfig};
use crate::domain::config::{
    ScanConfig, DEFAULT_MIN_HISTORY, DEFAULT_THRESHOLD, LEGACY_THRESHOLD,
};
use crate::domain::config_validation::{
    read_choice, read_date, validate_scan_config, ENTRY_MODES, PRESETS, STOP_MODES, TARGET_MODES,
};
use crate::domain::error::ScanError;
use crate::domain::pipeline::{self, BacktestSummary, ScanSummary};
use crate::domain::rule_parser;
use crate::domain::scoring::RuleSet;
use crate::domain::signal::{EntryMode, SignalConfig, SignalLedger, StopMode, TargetMode};
use crate::domain::universe::{parse_watchlist, Watchlist};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, DateRange};
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalStore;

#[derive(Parser, Debug)]
#[command(name = "stockscan", about = "Rule-based stock strength scanner and backtester")]
pub struct Cli {
    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the latest bar of every ticker and emit signals
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers, overriding [universe] tickers
        #[arg(long)]
        tickers: Option<String>,
        /// Signal log path, overriding [scan] signals_path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print signals without appending them to the log
        #[arg(long)]
        no_store: bool,
    },
    /// Replay history and simulate every qualifying bar
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        tickers: Option<String>,
        /// Outcomes CSV path, overriding [backtest] outcomes_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            tickers,
            output,
            no_store,
        } => run_scan(&config, tickers.as_deref(), output.as_deref(), no_store),
        Command::Backtest {
            config,
            tickers,
            output,
        } => run_backtest(&config, tickers.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScanError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_scan_config(&adapter).inspect_err(|e| {
        if let ScanError::RuleParse(parse) = e {
            if let Some(rules) = adapter.get_string("scoring", "rules") {
                eprintln!(
                    "error: failed to parse [scoring] rules:\n{}",
                    parse.display_with_context(&rules)
                );
            }
        }
    })?;
    Ok(adapter)
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> usize {
    config.get_int(section, key, default).max(0) as usize
}

pub fn build_rule_set(config: &dyn ConfigPort) -> Result<RuleSet, ScanError> {
    if let Some(rules) = config.get_string("scoring", "rules") {
        return Ok(rule_parser::parse(&rules)?);
    }
    let preset = read_choice(config, "scoring", "preset", "standard", PRESETS)?;
    Ok(match preset.as_str() {
        "legacy" => RuleSet::legacy(),
        _ => RuleSet::standard(config.get_bool("scoring", "slope_rule", false)),
    })
}

pub fn build_signal_config(
    config: &dyn ConfigPort,
    threshold: u32,
) -> Result<SignalConfig, ScanError> {
    let entry = match read_choice(config, "signal", "entry", "close", ENTRY_MODES)?.as_str() {
        "breakout_level" => EntryMode::BreakoutLevel {
            premium_pct: config.get_double("signal", "entry_premium_pct", 1.0),
        },
        _ => EntryMode::Close,
    };
    let stop = match read_choice(config, "signal", "stop", "fixed", STOP_MODES)?.as_str() {
        "swing_low" => StopMode::SwingLow {
            lookback: positive(config, "signal", "swing_lookback", 5),
        },
        _ => StopMode::FixedPct {
            pct: config.get_double("signal", "stop_pct", 5.0),
        },
    };
    let target = match read_choice(config, "signal", "target", "fixed", TARGET_MODES)?.as_str() {
        "risk_multiple" => TargetMode::RiskMultiple {
            multiple: config.get_double("signal", "risk_multiple", 2.0),
        },
        _ => TargetMode::FixedPct {
            pct: config.get_double("signal", "target_pct", 12.0),
        },
    };

    Ok(SignalConfig {
        threshold,
        entry,
        stop,
        target,
        min_rr: config.get_double("signal", "min_rr", 1.8),
    })
}

/// Threshold used when `[scan] threshold` is unset: the legacy preset keeps its own.
fn default_threshold(config: &dyn ConfigPort) -> Result<u32, ScanError> {
    if config.get_string("scoring", "rules").is_some() {
        return Ok(DEFAULT_THRESHOLD);
    }
    let preset = read_choice(config, "scoring", "preset", "standard", PRESETS)?;
    Ok(if preset == "legacy" {
        LEGACY_THRESHOLD
    } else {
        DEFAULT_THRESHOLD
    })
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, ScanError> {
    let min_history = positive(config, "scan", "min_history", DEFAULT_MIN_HISTORY as i64);
    let threshold = config
        .get_int("scan", "threshold", default_threshold(config)? as i64)
        .clamp(0, 100) as u32;

    Ok(ScanConfig {
        min_history,
        workers: positive(config, "scan", "workers", 1).max(1),
        scoring: build_rule_set(config)?,
        signal: build_signal_config(config, threshold)?,
        simulation: SimulationConfig {
            lookahead: positive(config, "backtest", "lookahead", 10),
            stop_pct: config.get_double("backtest", "stop_pct", 6.0),
            threshold,
            allow_overlap: config.get_bool("backtest", "allow_overlap", true),
            min_history,
        },
        as_of: read_date(config, "scan", "as_of")?,
    })
}

/// Tickers from the command line, then `[universe] tickers`, then the built-in sector map.
pub fn resolve_watchlist(
    override_tickers: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Watchlist, ScanError> {
    if let Some(t) = override_tickers {
        return Ok(parse_watchlist(t)?);
    }
    match config.get_string("universe", "tickers") {
        Some(t) => Ok(parse_watchlist(&t)?),
        None => Ok(Watchlist::default_sectors()),
    }
}

pub fn resolve_date_range(config: &dyn ConfigPort) -> Result<DateRange, ScanError> {
    Ok(DateRange {
        start: read_date(config, "data", "start_date")?,
        end: read_date(config, "data", "end_date")?,
    })
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, ScanError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| ScanError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

fn run_scan(
    config_path: &Path,
    tickers: Option<&str>,
    output: Option<&Path>,
    no_store: bool,
) -> Result<(), ScanError> {
    let adapter = load_config(config_path)?;
    let config = build_scan_config(&adapter)?;
    let watchlist = resolve_watchlist(tickers, &adapter)?;
    let range = resolve_date_range(&adapter)?;
    let data = data_adapter(&adapter)?;

    let mut store = CsvSignalStore::new(output.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("scan", "signals_path")
                .unwrap_or_else(|| "signals.csv".to_string()),
        )
    }));

    let summary = scan_and_store(&data, &mut store, &watchlist, range, &config, !no_store)?;
    print_signals(&summary);
    print_scan_summary(&summary, &watchlist);
    if !no_store && !summary.signals().is_empty() {
        eprintln!("\nSignals appended to: {}", store.path().display());
    }
    Ok(())
}

/// Scan `watchlist`, skipping `(ticker, date)` pairs already in `store`, and
/// optionally append the new signals to it.
pub fn scan_and_store(
    data: &dyn DataPort,
    store: &mut dyn SignalStore,
    watchlist: &Watchlist,
    range: DateRange,
    config: &ScanConfig,
    persist: bool,
) -> Result<ScanSummary, ScanError> {
    let mut ledger = SignalLedger::new();
    for (ticker, date) in store.stored_keys()? {
        ledger.mark(&ticker, date);
    }

    let summary = pipeline::run_scan(data, watchlist, range, config, &mut ledger);

    if persist {
        let signals: Vec<_> = summary.signals().into_iter().cloned().collect();
        store.append(&signals)?;
    }
    Ok(summary)
}

fn run_backtest(
    config_path: &Path,
    tickers: Option<&str>,
    output: Option<&Path>,
) -> Result<(), ScanError> {
    let adapter = load_config(config_path)?;
    let config = build_scan_config(&adapter)?;
    let watchlist = resolve_watchlist(tickers, &adapter)?;
    let range = resolve_date_range(&adapter)?;
    let data = data_adapter(&adapter)?;

    let outcomes_path = output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("backtest", "outcomes_path"))
        .unwrap_or_else(|| "outcomes.csv".to_string());

    let summary = backtest_and_report(
        &data,
        &CsvReportAdapter::new(),
        &watchlist,
        range,
        &config,
        &outcomes_path,
    )?;
    print_backtest_summary(&summary);
    eprintln!("\nOutcomes written to: {}", outcomes_path);
    Ok(())
}

pub fn backtest_and_report(
    data: &dyn DataPort,
    report: &dyn ReportPort,
    watchlist: &Watchlist,
    range: DateRange,
    config: &ScanConfig,
    output_path: &str,
) -> Result<BacktestSummary, ScanError> {
    let summary = pipeline::run_backtest(data, watchlist, range, config);
    if summary.tickers.is_empty() {
        return Err(ScanError::NoData {
            ticker: "all".to_string(),
        });
    }
    report.write_outcomes(&summary.outcomes(), output_path)?;
    Ok(summary)
}

fn run_validate(config_path: &Path) -> Result<(), ScanError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let config = build_scan_config(&adapter)?;
    let watchlist = resolve_watchlist(None, &adapter)?;

    let max_score = config.scoring.max_attainable();
    eprintln!("\nScoring rules:  {}", config.scoring);
    eprintln!("Max score:      {}", max_score);
    eprintln!("Threshold:      {}", config.signal.threshold);
    eprintln!("Min history:    {} bars", config.min_history);
    eprintln!(
        "Signal plan:    {:?} / {:?} / {:?}",
        config.signal.entry, config.signal.stop, config.signal.target
    );
    eprintln!("Min R/R:        {:.2}", config.signal.min_rr);
    eprintln!(
        "Simulation:     lookahead {} bars, stop {:.1}%, overlap {}",
        config.simulation.lookahead, config.simulation.stop_pct, config.simulation.allow_overlap
    );
    eprintln!("Workers:        {}", config.workers);
    eprintln!("Watchlist:      {} tickers", watchlist.count());

    match data_adapter(&adapter)?.list_tickers() {
        Ok(available) => {
            let missing: Vec<String> = watchlist
                .tickers()
                .into_iter()
                .filter(|t| !available.contains(t))
                .collect();
            eprintln!("Data files:     {} found", available.len());
            if !missing.is_empty() {
                warn!(
                    count = missing.len(),
                    tickers = %missing.join(","),
                    "watchlist tickers without data"
                );
            }
        }
        Err(e) => warn!(error = %e, "cannot list data directory"),
    }

    if config.signal.threshold > max_score {
        warn!(
            threshold = config.signal.threshold,
            max_score, "threshold is above the highest attainable score; no signal can fire"
        );
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn print_signals(summary: &ScanSummary) {
    let mut signals = summary.signals();
    if signals.is_empty() {
        eprintln!("No signals today");
        return;
    }
    signals.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.ticker.cmp(&b.ticker)));

    println!(
        "{:<10} {:<8} {:>5} {:<6} {:>10} {:>10} {:>10} {:>10} {:>5}",
        "TICKER", "SECTOR", "SCORE", "TIER", "PRICE", "ENTRY", "STOP", "TARGET", "RR"
    );
    for s in signals {
        println!(
            "{:<10} {:<8} {:>5} {:<6} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>5.2}",
            s.ticker,
            s.sector.as_deref().unwrap_or("-"),
            s.score,
            s.tier.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            s.price,
            s.entry,
            s.stop,
            s.target,
            s.rr,
        );
    }
}

fn print_scan_summary(summary: &ScanSummary, watchlist: &Watchlist) {
    eprintln!("\n=== Scan Summary ===");
    eprintln!("Tickers:          {}", watchlist.count());
    eprintln!("Scored:           {}", summary.scans.len());
    eprintln!("Signals:          {}", summary.signals().len());
    eprintln!("Skipped:          {}", summary.skipped.len());
    for (reason, count) in summary.skip_counts() {
        eprintln!("  {}: {}", reason, count);
    }
    let by_sector = summary.signals_by_sector();
    if !by_sector.is_empty() {
        eprintln!("\n=== Signals by Sector ===");
        for (sector, count) in by_sector {
            eprintln!("  {}: {}", sector, count);
        }
    }
}

fn print_backtest_summary(summary: &BacktestSummary) {
    let report = &summary.report;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Trades:     {}", report.total_trades);
    eprintln!("Wins / Losses:    {} / {}", report.wins, report.losses);
    eprintln!("Win Rate:         {:.1}%", report.win_rate * 100.0);
    eprintln!("Average R:        {:.2}", report.average_rr);
    eprintln!("Best / Worst R:   {:.2} / {:.2}", report.best_rr, report.worst_rr);
    eprintln!("Avg Bars Held:    {:.1}", report.average_bars_held);
    for reason in [ExitReason::StopLoss, ExitReason::TrailingExit, ExitReason::TimeExit] {
        eprintln!("  {}: {}", reason, report.exit_count(reason));
    }

    if !report.per_ticker.is_empty() {
        eprintln!("\n=== Per-Ticker Summary ===");
        for (ticker, stats) in &report.per_ticker {
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {:+.2}R avg",
                ticker,
                stats.trades,
                stats.win_rate * 100.0,
                stats.average_rr,
            );
        }
    }

    if !summary.skipped.is_empty() {
        eprintln!("\nSkipped {} tickers:", summary.skipped.len());
        for (reason, count) in summary.skip_counts() {
            eprintln!("  {}: {}", reason, count);
        }
    }
}
