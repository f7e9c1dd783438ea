//! Append-only CSV signal log.
//!
//! The header is written when the file is first created. Existing rows are
//! read back only to answer duplicate checks.

use crate::domain::error::ScanError;
use crate::domain::signal::Signal;
use crate::ports::signal_port::SignalStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct SignalRecord<'a> {
    date: String,
    ticker: &'a str,
    sector: &'a str,
    score: u32,
    tier: String,
    price: f64,
    entry: f64,
    stop: f64,
    target: f64,
    rr: f64,
    breakout: bool,
    pullback: bool,
    volume_ratio: f64,
    rsi: Option<f64>,
    cmf: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StoredKey {
    date: String,
    ticker: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<'a> From<&'a Signal> for SignalRecord<'a> {
    fn from(s: &'a Signal) -> Self {
        Self {
            date: s.date.format("%Y-%m-%d").to_string(),
            ticker: &s.ticker,
            sector: s.sector.as_deref().unwrap_or("N/A"),
            score: s.score,
            tier: s.tier.map(|t| t.to_string()).unwrap_or_default(),
            price: round2(s.price),
            entry: round2(s.entry),
            stop: round2(s.stop),
            target: round2(s.target),
            rr: round2(s.rr),
            breakout: s.breakout,
            pullback: s.pullback,
            volume_ratio: round2(s.volume_ratio),
            rsi: s.rsi.map(round2),
            cmf: s.cmf.map(|c| (c * 10_000.0).round() / 10_000.0),
        }
    }
}

fn store_error(reason: String) -> ScanError {
    ScanError::SignalStore { reason }
}

pub struct CsvSignalStore {
    path: PathBuf,
}

impl CsvSignalStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_empty_file(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true)
    }
}

impl SignalStore for CsvSignalStore {
    fn has_signal(&self, ticker: &str, date: NaiveDate) -> Result<bool, ScanError> {
        Ok(self
            .stored_keys()?
            .iter()
            .any(|(t, d)| t == ticker && *d == date))
    }

    fn stored_keys(&self) -> Result<Vec<(String, NaiveDate)>, ScanError> {
        if self.is_empty_file() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&self.path)
            .map_err(|e| store_error(format!("failed to open {}: {}", self.path.display(), e)))?;
        let mut keys = Vec::new();
        for row in rdr.deserialize::<StoredKey>() {
            let row = row.map_err(|e| store_error(format!("corrupt signal row: {}", e)))?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
                .map_err(|e| store_error(format!("invalid stored date '{}': {}", row.date, e)))?;
            keys.push((row.ticker, date));
        }
        Ok(keys)
    }

    fn append(&mut self, signals: &[Signal]) -> Result<(), ScanError> {
        if signals.is_empty() {
            return Ok(());
        }

        let write_header = self.is_empty_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        for signal in signals {
            wtr.serialize(SignalRecord::from(signal))
                .map_err(|e| store_error(format!("failed to write signal: {}", e)))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::Tier;
    use tempfile::TempDir;

    fn signal(ticker: &str, day: u32) -> Signal {
        Signal {
            ticker: ticker.into(),
            sector: Some("BANKING".into()),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            score: 85,
            tier: Tier::classify(85),
            price: 101.234,
            entry: 101.234,
            stop: 96.17,
            target: 113.38,
            rr: 2.4,
            breakout: true,
            pullback: false,
            volume_ratio: 3.0,
            rsi: Some(61.5),
            cmf: None,
        }
    }

    #[test]
    fn header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signals.csv");
        let mut store = CsvSignalStore::new(&path);
        assert_eq!(store.path(), path.as_path());

        store.append(&[signal("VCB.HM", 2)]).unwrap();
        store.append(&[signal("FPT.HM", 2)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,ticker,sector,score,tier"));
        assert!(lines[1].starts_with("2024-05-02,VCB.HM,BANKING,85,ELITE,101.23"));
        assert_eq!(content.matches("date,ticker").count(), 1);
    }

    #[test]
    fn stored_signals_are_detected() {
        let dir = TempDir::new().unwrap();
        let mut store = CsvSignalStore::new(dir.path().join("signals.csv"));
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        assert!(!store.has_signal("VCB.HM", d2).unwrap());
        store.append(&[signal("VCB.HM", 2)]).unwrap();

        assert!(store.has_signal("VCB.HM", d2).unwrap());
        assert!(!store.has_signal("VCB.HM", d2.succ_opt().unwrap()).unwrap());
        assert!(!store.has_signal("FPT.HM", d2).unwrap());
        assert_eq!(store.stored_keys().unwrap(), vec![("VCB.HM".to_string(), d2)]);
    }

    #[test]
    fn empty_append_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signals.csv");
        let mut store = CsvSignalStore::new(&path);
        store.append(&[]).unwrap();
        assert!(!path.exists());
    }
}
