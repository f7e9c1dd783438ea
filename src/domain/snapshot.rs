//! Annotated bar series and per-bar indicator snapshots.
//!
//! `AnnotatedSeries` owns one ticker's bars together with the indicator
//! series derived from them. The bars are never modified; indicators live in
//! a parallel map keyed by `IndicatorType`.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const MA_FAST: usize = 20;
pub const MA_SLOW: usize = 50;
pub const BREAKOUT_WINDOW: usize = 20;
pub const VOLUME_WINDOW: usize = 20;
pub const RSI_PERIOD: usize = 14;
pub const CMF_PERIOD: usize = 20;

pub const STANDARD_INDICATORS: [IndicatorType; 6] = [
    IndicatorType::Sma(MA_FAST),
    IndicatorType::Sma(MA_SLOW),
    IndicatorType::ShiftedHigh(BREAKOUT_WINDOW),
    IndicatorType::VolumeSma(VOLUME_WINDOW),
    IndicatorType::Rsi(RSI_PERIOD),
    IndicatorType::Cmf(CMF_PERIOD),
];

/// Derived values for one bar. `None` means the window was incomplete or
/// touched a corrupt bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub corrupt: bool,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub high20_shifted: Option<f64>,
    pub vol_ma20: Option<f64>,
    pub rsi14: Option<f64>,
    pub cmf20: Option<f64>,
}

impl IndicatorSnapshot {
    /// volume / VolMA20, or 0 when the average is undefined or zero.
    pub fn volume_ratio(&self) -> f64 {
        match self.vol_ma20 {
            Some(avg) if avg > 0.0 => self.volume / avg,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotatedSeries {
    pub ticker: String,
    pub sector: Option<String>,
    pub bars: Vec<OhlcvBar>,
    pub indicators: HashMap<IndicatorType, IndicatorSeries>,
}

impl AnnotatedSeries {
    /// Annotate `bars` with the standard indicator set plus any `extra` types.
    pub fn new(ticker: String, bars: Vec<OhlcvBar>, extra: &[IndicatorType]) -> Self {
        let mut types: Vec<IndicatorType> = STANDARD_INDICATORS.to_vec();
        for t in extra {
            if !types.contains(t) {
                types.push(*t);
            }
        }
        let indicators = compute_indicators(&bars, &types);
        Self {
            ticker,
            sector: None,
            bars,
            indicators,
        }
    }

    pub fn with_sector(mut self, sector: Option<String>) -> Self {
        self.sector = sector;
        self
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn indicator(&self, indicator_type: IndicatorType, index: usize) -> Option<f64> {
        self.indicators
            .get(&indicator_type)
            .and_then(|s| s.value_at(index))
    }

    pub fn ma20(&self, index: usize) -> Option<f64> {
        self.indicator(IndicatorType::Sma(MA_FAST), index)
    }

    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        let bar = self.bars.get(index)?;
        Some(IndicatorSnapshot {
            index,
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            corrupt: bar.is_corrupt(),
            ma20: self.indicator(IndicatorType::Sma(MA_FAST), index),
            ma50: self.indicator(IndicatorType::Sma(MA_SLOW), index),
            high20_shifted: self.indicator(IndicatorType::ShiftedHigh(BREAKOUT_WINDOW), index),
            vol_ma20: self.indicator(IndicatorType::VolumeSma(VOLUME_WINDOW), index),
            rsi14: self.indicator(IndicatorType::Rsi(RSI_PERIOD), index),
            cmf20: self.indicator(IndicatorType::Cmf(CMF_PERIOD), index),
        })
    }

    pub fn latest_snapshot(&self) -> Option<IndicatorSnapshot> {
        self.bars.len().checked_sub(1).and_then(|i| self.snapshot(i))
    }
}
