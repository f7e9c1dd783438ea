//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// A bar is corrupt when its range is inverted, its volume is negative,
    /// or any price field is not finite.
    pub fn is_corrupt(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().any(|p| !p.is_finite())
            || !self.volume.is_finite()
            || self.volume < 0.0
            || self.high < self.low
    }

    /// ((close - low) - (high - close)) / (high - low), or 0 for a zero-range bar.
    pub fn money_flow_multiplier(&self) -> f64 {
        let range = self.high - self.low;
        if range == 0.0 {
            return 0.0;
        }
        ((self.close - self.low) - (self.high - self.close)) / range
    }
}
