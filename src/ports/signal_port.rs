//! Signal persistence port trait.

use crate::domain::error::ScanError;
use crate::domain::signal::Signal;
use chrono::NaiveDate;

pub trait SignalStore {
    /// Whether a signal for `ticker` on `date` was stored by an earlier run.
    fn has_signal(&self, ticker: &str, date: NaiveDate) -> Result<bool, ScanError>;

    /// Every `(ticker, date)` pair already stored.
    fn stored_keys(&self) -> Result<Vec<(String, NaiveDate)>, ScanError>;

    fn append(&mut self, signals: &[Signal]) -> Result<(), ScanError>;
}
