//! Backtest aggregation over simulated trade outcomes.

use super::backtest::{ExitReason, TradeOutcome};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub average_rr: f64,
}

impl TradeStats {
    fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TradeOutcome>) -> Self {
        let mut trades = 0usize;
        let mut wins = 0usize;
        let mut total_rr = 0.0_f64;

        for outcome in outcomes {
            trades += 1;
            if outcome.is_win() {
                wins += 1;
            }
            total_rr += outcome.realized_rr;
        }

        let (win_rate, average_rr) = if trades > 0 {
            (wins as f64 / trades as f64, total_rr / trades as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            trades,
            wins,
            win_rate,
            average_rr,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub average_rr: f64,
    pub best_rr: f64,
    pub worst_rr: f64,
    pub average_bars_held: f64,
    pub by_exit_reason: BTreeMap<ExitReason, usize>,
    pub per_ticker: BTreeMap<String, TradeStats>,
}

impl BacktestReport {
    /// A trade is a win when its realized R multiple is positive. With no
    /// trades every ratio is reported as 0.
    pub fn compute(outcomes: &[TradeOutcome]) -> Self {
        let overall = TradeStats::from_outcomes(outcomes);

        let mut by_exit_reason = BTreeMap::new();
        let mut grouped: BTreeMap<String, Vec<&TradeOutcome>> = BTreeMap::new();
        let mut best_rr = f64::NEG_INFINITY;
        let mut worst_rr = f64::INFINITY;
        let mut total_bars = 0usize;

        for outcome in outcomes {
            *by_exit_reason.entry(outcome.exit_reason).or_insert(0) += 1;
            grouped
                .entry(outcome.ticker.clone())
                .or_default()
                .push(outcome);
            best_rr = best_rr.max(outcome.realized_rr);
            worst_rr = worst_rr.min(outcome.realized_rr);
            total_bars += outcome.bars_held();
        }

        let per_ticker = grouped
            .into_iter()
            .map(|(ticker, trades)| (ticker, TradeStats::from_outcomes(trades)))
            .collect();

        let (best_rr, worst_rr, average_bars_held) = if overall.trades > 0 {
            (
                best_rr,
                worst_rr,
                total_bars as f64 / overall.trades as f64,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        Self {
            total_trades: overall.trades,
            wins: overall.wins,
            losses: overall.trades - overall.wins,
            win_rate: overall.win_rate,
            average_rr: overall.average_rr,
            best_rr,
            worst_rr,
            average_bars_held,
            by_exit_reason,
            per_ticker,
        }
    }

    pub fn exit_count(&self, reason: ExitReason) -> usize {
        self.by_exit_reason.get(&reason).copied().unwrap_or(0)
    }
}
