//! CSV export of simulated trade outcomes.

use crate::domain::backtest::TradeOutcome;
use crate::domain::error::ScanError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OutcomeRecord<'a> {
    ticker: &'a str,
    entry_index: usize,
    entry_date: String,
    exit_index: usize,
    exit_date: String,
    score: u32,
    entry_price: f64,
    stop: f64,
    exit_price: f64,
    exit_reason: &'static str,
    realized_rr: f64,
}

impl<'a> From<&'a TradeOutcome> for OutcomeRecord<'a> {
    fn from(o: &'a TradeOutcome) -> Self {
        Self {
            ticker: &o.ticker,
            entry_index: o.entry_index,
            entry_date: o.entry_date.format("%Y-%m-%d").to_string(),
            exit_index: o.exit_index,
            exit_date: o.exit_date.format("%Y-%m-%d").to_string(),
            score: o.score,
            entry_price: o.entry_price,
            stop: o.stop,
            exit_price: o.exit_price,
            exit_reason: o.exit_reason.as_str(),
            realized_rr: o.realized_rr,
        }
    }
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_outcomes(
        &self,
        outcomes: &[TradeOutcome],
        output_path: &str,
    ) -> Result<(), ScanError> {
        let report_error = |e: csv::Error| ScanError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        };

        let mut wtr = csv::Writer::from_path(output_path).map_err(report_error)?;
        if outcomes.is_empty() {
            wtr.write_record([
                "ticker",
                "entry_index",
                "entry_date",
                "exit_index",
                "exit_date",
                "score",
                "entry_price",
                "stop",
                "exit_price",
                "exit_reason",
                "realized_rr",
            ])
            .map_err(report_error)?;
        }
        for outcome in outcomes {
            wtr.serialize(OutcomeRecord::from(outcome))
                .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
