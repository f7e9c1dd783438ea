//! Market data port trait.

use crate::domain::error::ScanError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Inclusive date filter applied when fetching bars. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Source of daily bars. Implementations are shared across worker threads.
pub trait DataPort: Send + Sync {
    /// Bars for `ticker` in chronological order. An unknown ticker yields an
    /// empty vector rather than an error.
    fn fetch_bars(&self, ticker: &str, range: DateRange) -> Result<Vec<OhlcvBar>, ScanError>;

    fn list_tickers(&self) -> Result<Vec<String>, ScanError>;

    /// Fetch several tickers in one call. Results are in input order and must
    /// match what `fetch_bars` returns for each ticker.
    fn fetch_batch(
        &self,
        tickers: &[String],
        range: DateRange,
    ) -> Vec<(String, Result<Vec<OhlcvBar>, ScanError>)> {
        tickers
            .iter()
            .map(|t| (t.clone(), self.fetch_bars(t, range)))
            .collect()
    }
}
