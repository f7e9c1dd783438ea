//! Per-ticker pipelines over a watchlist.
//!
//! Each ticker is fetched, annotated and scored on its own; a failure for one
//! ticker becomes a `SkippedTicker` and never stops the others. With more than
//! one worker the tickers are processed on a private rayon pool. Results are
//! always returned in watchlist order.

use crate::domain::backtest::{simulate, TradeOutcome};
use crate::domain::config::ScanConfig;
use crate::domain::error::{ScanError, SkipReason};
use crate::domain::metrics::BacktestReport;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::scoring::Score;
use crate::domain::signal::{generate_signal, Signal, SignalLedger, SignalRejection};
use crate::domain::snapshot::AnnotatedSeries;
use crate::domain::universe::{Watchlist, WatchlistEntry};
use crate::ports::data_port::{DataPort, DateRange};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const UNASSIGNED_SECTOR: &str = "UNASSIGNED";

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub sector: Option<String>,
    pub reason: SkipReason,
}

/// Live-path result for one ticker: the latest bar's score and either the
/// emitted signal or the reason none was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerScan {
    pub ticker: String,
    pub sector: Option<String>,
    pub date: NaiveDate,
    pub score: Score,
    pub outcome: Result<Signal, SignalRejection>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub scans: Vec<TickerScan>,
    pub skipped: Vec<SkippedTicker>,
}

impl ScanSummary {
    pub fn signals(&self) -> Vec<&Signal> {
        self.scans
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok())
            .collect()
    }

    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        count_skips(&self.skipped)
    }

    pub fn signals_by_sector(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for signal in self.signals() {
            let sector = signal
                .sector
                .clone()
                .unwrap_or_else(|| UNASSIGNED_SECTOR.to_string());
            *counts.entry(sector).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerBacktest {
    pub ticker: String,
    pub sector: Option<String>,
    pub bars: usize,
    pub outcomes: Vec<TradeOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestSummary {
    pub tickers: Vec<TickerBacktest>,
    pub skipped: Vec<SkippedTicker>,
    pub report: BacktestReport,
}

impl BacktestSummary {
    /// All outcomes in watchlist order, then bar order.
    pub fn outcomes(&self) -> Vec<TradeOutcome> {
        self.tickers
            .iter()
            .flat_map(|t| t.outcomes.iter().cloned())
            .collect()
    }

    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        count_skips(&self.skipped)
    }
}

fn count_skips(skipped: &[SkippedTicker]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for s in skipped {
        *counts.entry(s.reason.code()).or_insert(0) += 1;
    }
    counts
}

/// Turn fetched bars into an annotated series, or the reason the ticker is skipped.
pub fn annotate(
    entry: &WatchlistEntry,
    fetched: Result<Vec<OhlcvBar>, ScanError>,
    config: &ScanConfig,
) -> Result<AnnotatedSeries, SkipReason> {
    let bars = fetched.map_err(|e| SkipReason::FetchFailed {
        reason: e.to_string(),
    })?;
    if bars.is_empty() {
        return Err(SkipReason::NoData);
    }
    if bars.len() < config.min_history {
        return Err(SkipReason::InsufficientHistory {
            bars: bars.len(),
            minimum: config.min_history,
        });
    }
    Ok(
        AnnotatedSeries::new(entry.ticker.clone(), bars, &config.extra_indicators())
            .with_sector(entry.sector.clone()),
    )
}

/// Score the latest bar of `series` and try to build a signal from it.
pub fn scan_series(
    series: &AnnotatedSeries,
    config: &ScanConfig,
) -> Result<TickerScan, SkipReason> {
    let snap = series.latest_snapshot().ok_or(SkipReason::NoData)?;
    if snap.corrupt {
        return Err(SkipReason::CorruptLatestBar { date: snap.date });
    }

    let score = config.scoring.score_snapshot(series, &snap);
    let mut outcome = generate_signal(series, &snap, &score, &config.signal);
    if let (Ok(signal), Some(as_of)) = (&mut outcome, config.as_of) {
        signal.date = as_of;
    }

    Ok(TickerScan {
        ticker: series.ticker.clone(),
        sector: series.sector.clone(),
        date: snap.date,
        score,
        outcome,
    })
}

pub fn backtest_series(series: &AnnotatedSeries, config: &ScanConfig) -> Vec<TradeOutcome> {
    simulate(series, &config.scoring, &config.simulation)
}

/// Live scan over `watchlist`. Signals whose `(ticker, date)` is already in
/// `ledger` are turned into `Duplicate` rejections; new ones are recorded.
pub fn run_scan(
    data: &dyn DataPort,
    watchlist: &Watchlist,
    range: DateRange,
    config: &ScanConfig,
    ledger: &mut SignalLedger,
) -> ScanSummary {
    info!(
        tickers = watchlist.count(),
        workers = config.workers,
        "scanning watchlist"
    );

    let results = for_each_ticker(
        data,
        watchlist,
        range,
        config.workers,
        |entry, fetched| -> Result<TickerScan, SkipReason> {
            let series = annotate(entry, fetched, config)?;
            scan_series(&series, config)
        },
    );

    let mut summary = ScanSummary::default();
    for (entry, result) in watchlist.entries.iter().zip(results) {
        match result {
            Ok(mut scan) => {
                scan.outcome = scan.outcome.and_then(|signal| ledger.admit(signal));
                match &scan.outcome {
                    Ok(signal) => info!(
                        ticker = %signal.ticker,
                        score = signal.score,
                        entry = signal.entry,
                        stop = signal.stop,
                        target = signal.target,
                        "signal"
                    ),
                    Err(rejection) => debug!(
                        ticker = %scan.ticker,
                        score = scan.score.value,
                        %rejection,
                        "no signal"
                    ),
                }
                summary.scans.push(scan);
            }
            Err(reason) => summary.skipped.push(skip(entry, reason)),
        }
    }

    info!(
        scanned = summary.scans.len(),
        signals = summary.signals().len(),
        skipped = summary.skipped.len(),
        "scan complete"
    );
    summary
}

/// Forward-simulate every ticker in `watchlist` and aggregate the outcomes.
pub fn run_backtest(
    data: &dyn DataPort,
    watchlist: &Watchlist,
    range: DateRange,
    config: &ScanConfig,
) -> BacktestSummary {
    info!(
        tickers = watchlist.count(),
        lookahead = config.simulation.lookahead,
        stop_pct = config.simulation.stop_pct,
        "backtesting watchlist"
    );

    let results = for_each_ticker(
        data,
        watchlist,
        range,
        config.workers,
        |entry, fetched| -> Result<TickerBacktest, SkipReason> {
            let series = annotate(entry, fetched, config)?;
            Ok(TickerBacktest {
                ticker: series.ticker.clone(),
                sector: series.sector.clone(),
                bars: series.bar_count(),
                outcomes: backtest_series(&series, config),
            })
        },
    );

    let mut summary = BacktestSummary::default();
    for (entry, result) in watchlist.entries.iter().zip(results) {
        match result {
            Ok(ticker) => {
                debug!(
                    ticker = %ticker.ticker,
                    bars = ticker.bars,
                    trades = ticker.outcomes.len(),
                    "simulated"
                );
                summary.tickers.push(ticker);
            }
            Err(reason) => summary.skipped.push(skip(entry, reason)),
        }
    }

    summary.report = BacktestReport::compute(&summary.outcomes());
    info!(
        trades = summary.report.total_trades,
        win_rate = summary.report.win_rate,
        average_rr = summary.report.average_rr,
        skipped = summary.skipped.len(),
        "backtest complete"
    );
    summary
}

fn skip(entry: &WatchlistEntry, reason: SkipReason) -> SkippedTicker {
    warn!(ticker = %entry.ticker, %reason, "skipping ticker");
    SkippedTicker {
        ticker: entry.ticker.clone(),
        sector: entry.sector.clone(),
        reason,
    }
}

/// Run `work` for every watchlist entry with its fetched bars, returning
/// results in watchlist order. One worker fetches the whole list as a batch;
/// more workers fetch and process each ticker on a dedicated pool.
fn for_each_ticker<T, F>(
    data: &dyn DataPort,
    watchlist: &Watchlist,
    range: DateRange,
    workers: usize,
    work: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(&WatchlistEntry, Result<Vec<OhlcvBar>, ScanError>) -> T + Sync,
{
    if workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => {
                return pool.install(|| {
                    watchlist
                        .entries
                        .par_iter()
                        .map(|entry| work(entry, data.fetch_bars(&entry.ticker, range)))
                        .collect()
                });
            }
            Err(e) => warn!(error = %e, "failed to build worker pool, running sequentially"),
        }
    }

    let mut batch: HashMap<String, Result<Vec<OhlcvBar>, ScanError>> =
        data.fetch_batch(&watchlist.tickers(), range).into_iter().collect();

    watchlist
        .entries
        .iter()
        .map(|entry| {
            let fetched = batch.remove(&entry.ticker).unwrap_or_else(|| {
                Err(ScanError::DataSource {
                    reason: format!("{} missing from batch response", entry.ticker),
                })
            });
            work(entry, fetched)
        })
        .collect()
}
