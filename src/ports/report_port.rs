//! Backtest report port trait.

use crate::domain::backtest::TradeOutcome;
use crate::domain::error::ScanError;

/// Port for writing simulated trade outcomes. Aggregate metrics are printed
/// by the caller and never persisted.
pub trait ReportPort {
    fn write_outcomes(
        &self,
        outcomes: &[TradeOutcome],
        output_path: &str,
    ) -> Result<(), ScanError>;
}
