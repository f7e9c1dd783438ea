//! Signal generation: turns a qualifying score into an entry/stop/target plan.

use crate::domain::indicator::IndicatorType;
use crate::domain::scoring::{Score, Tier};
use crate::domain::snapshot::{AnnotatedSeries, IndicatorSnapshot};
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryMode {
    /// Enter at the bar's close.
    Close,
    /// Enter `premium_pct` percent above the shifted 20-bar high.
    BreakoutLevel { premium_pct: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopMode {
    /// `pct` percent below entry.
    FixedPct { pct: f64 },
    /// Lowest low over the trailing `lookback` bars, current bar included.
    SwingLow { lookback: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetMode {
    FixedPct { pct: f64 },
    RiskMultiple { multiple: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub threshold: u32,
    pub entry: EntryMode,
    pub stop: StopMode,
    pub target: TargetMode,
    pub min_rr: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            threshold: 60,
            entry: EntryMode::Close,
            stop: StopMode::FixedPct { pct: 5.0 },
            target: TargetMode::FixedPct { pct: 12.0 },
            min_rr: 1.8,
        }
    }
}

impl SignalConfig {
    /// Indicators beyond the standard snapshot that this configuration reads.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self.stop {
            StopMode::SwingLow { lookback } => vec![IndicatorType::LowestLow(lookback)],
            StopMode::FixedPct { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub ticker: String,
    pub sector: Option<String>,
    pub date: NaiveDate,
    pub score: u32,
    pub tier: Option<Tier>,
    pub price: f64,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub rr: f64,
    pub breakout: bool,
    pub pullback: bool,
    pub volume_ratio: f64,
    pub rsi: Option<f64>,
    pub cmf: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalRejection {
    #[error("score {score} below threshold {threshold}")]
    BelowThreshold { score: u32, threshold: u32 },

    #[error("{0} is undefined")]
    MissingIndicator(&'static str),

    #[error("entry is not above stop")]
    NonPositiveRisk,

    #[error("risk/reward {rr:.2} below minimum {minimum:.2}")]
    RiskRewardBelowMinimum { rr: f64, minimum: f64 },

    #[error("signal already emitted for this ticker and date")]
    Duplicate,
}

/// Build a trade plan for `snap` if `score` clears the threshold and the
/// resulting risk/reward is acceptable.
pub fn generate_signal(
    series: &AnnotatedSeries,
    snap: &IndicatorSnapshot,
    score: &Score,
    config: &SignalConfig,
) -> Result<Signal, SignalRejection> {
    if score.value < config.threshold {
        return Err(SignalRejection::BelowThreshold {
            score: score.value,
            threshold: config.threshold,
        });
    }

    let entry = match config.entry {
        EntryMode::Close => snap.close,
        EntryMode::BreakoutLevel { premium_pct } => {
            let level = snap
                .high20_shifted
                .ok_or(SignalRejection::MissingIndicator("High20Shifted"))?;
            level * (1.0 + premium_pct / 100.0)
        }
    };

    let stop = match config.stop {
        StopMode::FixedPct { pct } => entry * (1.0 - pct / 100.0),
        StopMode::SwingLow { lookback } => series
            .indicator(IndicatorType::LowestLow(lookback), snap.index)
            .ok_or(SignalRejection::MissingIndicator("swing low"))?,
    };

    let risk = entry - stop;
    if risk.is_nan() || risk <= 0.0 {
        return Err(SignalRejection::NonPositiveRisk);
    }

    let target = match config.target {
        TargetMode::FixedPct { pct } => entry * (1.0 + pct / 100.0),
        TargetMode::RiskMultiple { multiple } => entry + multiple * risk,
    };

    let rr = (target - entry) / risk;
    if rr.is_nan() || rr <= 0.0 || rr < config.min_rr {
        return Err(SignalRejection::RiskRewardBelowMinimum {
            rr,
            minimum: config.min_rr,
        });
    }

    Ok(Signal {
        ticker: series.ticker.clone(),
        sector: series.sector.clone(),
        date: snap.date,
        score: score.value,
        tier: Tier::classify(score.value),
        price: snap.close,
        entry,
        stop,
        target,
        rr,
        breakout: score.breakout,
        pullback: score.pullback,
        volume_ratio: score.volume_ratio,
        rsi: snap.rsi14,
        cmf: snap.cmf20,
    })
}

/// Tracks `(ticker, date)` pairs already emitted so a signal is never issued twice.
#[derive(Debug, Clone, Default)]
pub struct SignalLedger {
    seen: HashSet<(String, NaiveDate)>,
}

impl SignalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ticker: &str, date: NaiveDate) -> bool {
        self.seen.contains(&(ticker.to_string(), date))
    }

    pub fn mark(&mut self, ticker: &str, date: NaiveDate) {
        self.seen.insert((ticker.to_string(), date));
    }

    /// Record `signal`, rejecting it if its `(ticker, date)` was seen before.
    pub fn admit(&mut self, signal: Signal) -> Result<Signal, SignalRejection> {
        if self.seen.insert((signal.ticker.clone(), signal.date)) {
            Ok(signal)
        } else {
            Err(SignalRejection::Duplicate)
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
