#![allow(dead_code)]

use chrono::NaiveDate;
pub use stockscan::domain::ohlcv::OhlcvBar;
use stockscan::domain::error::ScanError;
use stockscan::ports::data_port::{DataPort, DateRange};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Index of the breakout bar in `breakout_series`.
pub const BREAKOUT_INDEX: usize = 75;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub batch_calls: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str, range: DateRange) -> Result<Vec<OhlcvBar>, ScanError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScanError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| bars.iter().filter(|b| range.contains(b.date)).cloned().collect())
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, ScanError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn fetch_batch(
        &self,
        tickers: &[String],
        range: DateRange,
    ) -> Vec<(String, Result<Vec<OhlcvBar>, ScanError>)> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        tickers
            .iter()
            .map(|t| (t.clone(), self.fetch_bars(t, range)))
            .collect()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(offset: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(offset as i64)
}

pub fn make_bar(
    ticker: &str,
    offset: usize,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: day(offset),
        open: close,
        high,
        low,
        close,
        volume,
    }
}

/// `count` bars with open = high = low = close and volume 1000.
pub fn flat_series(ticker: &str, count: usize, close: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(ticker, i, close, close, close, 1000.0))
        .collect()
}

/// 90 bars: a quiet stretch at 90 (bars 0-54), a base alternating between
/// 100 and 98 under a 101 high (bars 55-74), a breakout to 115 on triple
/// volume at bar 75, then a drift at 110 (bars 76-89).
///
/// Bar 75 scores 85 under the standard rules; every other bar from 60 on
/// scores below 60.
pub fn breakout_series(ticker: &str) -> Vec<OhlcvBar> {
    (0..90)
        .map(|i| match i {
            0..=54 => make_bar(ticker, i, 90.0, 90.5, 89.5, 1000.0),
            55..=74 => {
                let close = if (i - 55) % 2 == 0 { 100.0 } else { 98.0 };
                make_bar(ticker, i, close, 101.0, 97.0, 1000.0)
            }
            BREAKOUT_INDEX => make_bar(ticker, i, 115.0, 116.0, 112.0, 3000.0),
            _ => make_bar(ticker, i, 110.0, 111.0, 109.0, 1000.0),
        })
        .collect()
}

pub fn set_bar(bars: &mut [OhlcvBar], index: usize, close: f64, high: f64, low: f64) {
    let bar = &mut bars[index];
    bar.open = close;
    bar.close = close;
    bar.high = high;
    bar.low = low;
}

/// Write `bars` as `<dir>/<ticker>.csv` in the layout the CSV adapter reads.
pub fn write_csv(dir: &std::path::Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}
