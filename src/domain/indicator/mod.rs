//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! A point whose window is not yet full carries `None`, never a placeholder number.

pub mod cmf;
pub mod rolling;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn undefined(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    pub fn defined(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    /// Simple moving average of close.
    Sma(usize),
    /// Simple moving average of volume.
    VolumeSma(usize),
    /// Highest high over the n bars before the current one.
    ShiftedHigh(usize),
    /// Lowest low over the trailing n bars, current bar included.
    LowestLow(usize),
    Rsi(usize),
    /// Chaikin Money Flow.
    Cmf(usize),
}

impl IndicatorType {
    /// Number of bars, ending at and including the current bar, that feed the value.
    /// A corrupt bar anywhere in this span leaves the value undefined.
    pub fn span(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::VolumeSma(n)
            | IndicatorType::LowestLow(n)
            | IndicatorType::Cmf(n) => n,
            IndicatorType::ShiftedHigh(n) | IndicatorType::Rsi(n) => n + 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().and_then(|p| p.value)
    }

    pub(crate) fn all_undefined(indicator_type: IndicatorType, dates: &[NaiveDate]) -> Self {
        Self {
            indicator_type,
            values: dates.iter().map(|&d| IndicatorPoint::undefined(d)).collect(),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "MA{}", period),
            IndicatorType::VolumeSma(period) => write!(f, "VolMA{}", period),
            IndicatorType::ShiftedHigh(period) => write!(f, "High{}Shifted", period),
            IndicatorType::LowestLow(period) => write!(f, "Low{}", period),
            IndicatorType::Rsi(period) => write!(f, "RSI{}", period),
            IndicatorType::Cmf(period) => write!(f, "CMF{}", period),
        }
    }
}
