//! Forward simulation of historical signals.
//!
//! Every bar from `min_history` up to `len - lookahead` is scored with the
//! indicator values available at that bar. Qualifying bars open a long trade
//! at the close, which is then walked forward bar by bar until the stop, the
//! MA20 trailing exit, or the end of the lookahead window closes it.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::scoring::RuleSet;
use crate::domain::snapshot::AnnotatedSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub lookahead: usize,
    pub stop_pct: f64,
    pub threshold: u32,
    /// When false, bars are skipped while an earlier trade is still open.
    pub allow_overlap: bool,
    pub min_history: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lookahead: 10,
            stop_pct: 6.0,
            threshold: 60,
            allow_overlap: true,
            min_history: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExitReason {
    StopLoss,
    TrailingExit,
    TimeExit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrailingExit => "trailing_exit",
            ExitReason::TimeExit => "time_exit",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub ticker: String,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub score: u32,
    pub entry_price: f64,
    pub stop: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub realized_rr: f64,
}

impl TradeOutcome {
    pub fn is_win(&self) -> bool {
        self.realized_rr > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Replay `series` and return one outcome per qualifying bar, in bar order.
pub fn simulate(
    series: &AnnotatedSeries,
    rules: &RuleSet,
    config: &SimulationConfig,
) -> Vec<TradeOutcome> {
    let mut outcomes = Vec::new();
    if config.lookahead == 0 {
        return outcomes;
    }

    let end = series.bar_count().saturating_sub(config.lookahead);
    let mut next_free = config.min_history;

    for i in config.min_history..end {
        if !config.allow_overlap && i < next_free {
            continue;
        }

        let Some(score) = rules.score(series, i) else {
            continue;
        };
        if score.value < config.threshold {
            continue;
        }

        let entry_bar = &series.bars[i];
        let entry = entry_bar.close;
        let stop = entry * (1.0 - config.stop_pct / 100.0);
        let risk = entry - stop;
        if risk.is_nan() || risk <= 0.0 {
            continue;
        }

        let (exit_index, exit_price, exit_reason) = walk_forward(series, i, stop, config.lookahead);
        let exit_bar: &OhlcvBar = &series.bars[exit_index];

        outcomes.push(TradeOutcome {
            ticker: series.ticker.clone(),
            entry_index: i,
            entry_date: entry_bar.date,
            exit_index,
            exit_date: exit_bar.date,
            score: score.value,
            entry_price: entry,
            stop,
            exit_price,
            exit_reason,
            realized_rr: (exit_price - entry) / risk,
        });
        next_free = exit_index + 1;
    }

    outcomes
}

/// Apply the exit rules to bars `entry+1..=entry+lookahead`. The stop is
/// checked before the trailing exit on every bar. Corrupt bars never trigger
/// an exit.
fn walk_forward(
    series: &AnnotatedSeries,
    entry_index: usize,
    stop: f64,
    lookahead: usize,
) -> (usize, f64, ExitReason) {
    let last = entry_index + lookahead;
    let mut time_exit = (entry_index, series.bars[entry_index].close);

    for j in entry_index + 1..=last {
        let bar = &series.bars[j];
        if bar.is_corrupt() {
            continue;
        }
        if bar.low <= stop {
            return (j, stop, ExitReason::StopLoss);
        }
        if series.ma20(j).is_some_and(|ma| bar.close < ma) {
            return (j, bar.close, ExitReason::TrailingExit);
        }
        time_exit = (j, bar.close);
    }

    (time_exit.0, time_exit.1, ExitReason::TimeExit)
}
