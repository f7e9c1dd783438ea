//! Run configuration passed explicitly into every pipeline call.

use crate::domain::backtest::SimulationConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::scoring::RuleSet;
use crate::domain::signal::SignalConfig;
use chrono::NaiveDate;

pub const DEFAULT_MIN_HISTORY: usize = 60;
pub const DEFAULT_THRESHOLD: u32 = 60;
/// Signal threshold the legacy rule preset was tuned for.
pub const LEGACY_THRESHOLD: u32 = 55;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub min_history: usize,
    pub workers: usize,
    pub scoring: RuleSet,
    pub signal: SignalConfig,
    pub simulation: SimulationConfig,
    /// Date stamped on live signals. Defaults to the latest bar's date.
    pub as_of: Option<NaiveDate>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_history: DEFAULT_MIN_HISTORY,
            workers: 1,
            scoring: RuleSet::default(),
            signal: SignalConfig::default(),
            simulation: SimulationConfig::default(),
            as_of: None,
        }
    }
}

impl ScanConfig {
    /// Indicators needed beyond the standard snapshot set.
    pub fn extra_indicators(&self) -> Vec<IndicatorType> {
        self.signal.required_indicators()
    }
}
