//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain and loss are plain means over the trailing n close-to-close
//! changes, so each value depends only on the last n+1 closes.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain == 0: RSI = 50 (flat series)
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        return IndicatorSeries::all_undefined(IndicatorType::Rsi(period), &dates);
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len());
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len());
    gains.push(0.0);
    losses.push(0.0);

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < period {
                return IndicatorPoint::undefined(bar.date);
            }
            let avg_gain = gains[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            let avg_loss = losses[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            IndicatorPoint::defined(bar.date, rsi_from_averages(avg_gain, avg_loss))
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
