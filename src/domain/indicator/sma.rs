//! Simple moving averages of close and volume.
//!
//! SMA(n)[i] = sum(x[i-n+1..=i]) / n
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling_mean(bars, &closes, period, IndicatorType::Sma(period))
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    rolling_mean(bars, &volumes, period, IndicatorType::VolumeSma(period))
}

fn rolling_mean(
    bars: &[OhlcvBar],
    inputs: &[f64],
    period: usize,
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    if period == 0 {
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        return IndicatorSeries::all_undefined(indicator_type, &dates);
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return IndicatorPoint::undefined(bar.date);
            }
            let window = &inputs[i + 1 - period..=i];
            IndicatorPoint::defined(bar.date, window.iter().sum::<f64>() / period as f64)
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
