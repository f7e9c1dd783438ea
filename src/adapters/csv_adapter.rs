//! CSV file data adapter.
//!
//! Reads one `<TICKER>.csv` file per ticker from a base directory. Columns are
//! located by header name (case-insensitive): date, open, high, low, close, volume.
//! Empty numeric cells load as NaN so the bar is flagged corrupt downstream
//! instead of failing the whole file.

use crate::domain::error::ScanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::{DataPort, DateRange};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn data_error(reason: String) -> ScanError {
    ScanError::DataSource { reason }
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, ScanError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| data_error(format!("missing {} column", name)))?
        .trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse()
        .map_err(|e| data_error(format!("invalid {} value '{}': {}", name, raw, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str, range: DateRange) -> Result<Vec<OhlcvBar>, ScanError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            debug!(ticker, path = %path.display(), "no data file");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();

        let mut idx = [0usize; 6];
        for (slot, name) in idx.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    data_error(format!("{} has no '{}' column", path.display(), name))
                })?;
        }

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(idx[0])
                .ok_or_else(|| data_error("missing date column".into()))?
                .trim();
            // Accept plain dates and timestamps with a trailing time part.
            let date_part = date_str.get(..10).unwrap_or(date_str);
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|e| data_error(format!("invalid date '{}': {}", date_str, e)))?;

            if !range.contains(date) {
                continue;
            }

            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date,
                open: parse_price(&record, idx[1], "open")?,
                high: parse_price(&record, idx[2], "high")?,
                low: parse_price(&record, idx[3], "low")?,
                close: parse_price(&record, idx[4], "close")?,
                volume: parse_price(&record, idx[5], "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, ScanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
