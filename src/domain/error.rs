//! Domain error types.
//!
//! `ScanError` is for failures that stop a whole run. Anything that only
//! affects one ticker is a `SkipReason` and never leaves the pipeline as an error.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::universe::WatchlistError;

/// A parse error with position information for rule-set parsing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for stockscan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("signal store error: {reason}")]
    SignalStore { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScanError> for std::process::ExitCode {
    fn from(err: &ScanError) -> Self {
        let code: u8 = match err {
            ScanError::Io(_) => 1,
            ScanError::ConfigParse { .. }
            | ScanError::ConfigMissing { .. }
            | ScanError::ConfigInvalid { .. }
            | ScanError::Watchlist(_) => 2,
            ScanError::DataSource { .. }
            | ScanError::SignalStore { .. }
            | ScanError::Report { .. } => 3,
            ScanError::RuleParse(_) => 4,
            ScanError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Why a ticker was left out of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientHistory { bars: usize, minimum: usize },
    CorruptLatestBar { date: NaiveDate },
    FetchFailed { reason: String },
}

impl SkipReason {
    /// Stable short code used for summary counts.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::NoData => "no_data",
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::CorruptLatestBar { .. } => "corrupt_bar",
            SkipReason::FetchFailed { .. } => "fetch_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::CorruptLatestBar { date } => write!(f, "latest bar {} is corrupt", date),
            SkipReason::FetchFailed { reason } => write!(f, "fetch failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    fn code(err: &ScanError) -> String {
        format!("{:?}", ExitCode::from(err))
    }

    #[test]
    fn exit_codes_by_family() {
        let config = ScanError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        assert_eq!(code(&config), format!("{:?}", ExitCode::from(2)));

        let data = ScanError::DataSource {
            reason: "boom".into(),
        };
        assert_eq!(code(&data), format!("{:?}", ExitCode::from(3)));

        let rule = ScanError::from(ParseError {
            message: "bad".into(),
            position: 0,
        });
        assert_eq!(code(&rule), format!("{:?}", ExitCode::from(4)));

        let empty = ScanError::NoData {
            ticker: "all".into(),
        };
        assert_eq!(code(&empty), format!("{:?}", ExitCode::from(5)));
    }

    #[test]
    fn error_messages() {
        let err = ScanError::NoData {
            ticker: "VCB.HM".into(),
        };
        assert_eq!(err.to_string(), "no data for VCB.HM");

        let err = ScanError::ConfigInvalid {
            section: "scan".into(),
            key: "preset".into(),
            reason: "unknown preset".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [scan] preset: unknown preset"
        );
    }

    #[test]
    fn skip_reason_codes() {
        assert_eq!(SkipReason::NoData.code(), "no_data");
        assert_eq!(
            SkipReason::InsufficientHistory {
                bars: 3,
                minimum: 60
            }
            .to_string(),
            "only 3 bars, minimum 60 required"
        );
    }

    #[test]
    fn parse_error_context() {
        let err = ParseError {
            message: "expected integer".into(),
            position: 6,
        };
        let rendered = err.display_with_context("TREND:x");
        assert!(rendered.starts_with("TREND:x\n      ^\n"));
    }
}
