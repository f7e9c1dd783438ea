//! Chaikin Money Flow.
//!
//! CMF(n)[i] = sum(mfm[j] * volume[j]) / sum(volume[j]) for j in i-n+1..=i
//! where mfm is the bar's money-flow multiplier (0 for a zero-range bar).
//! A window with zero total volume yields 0.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_cmf(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Cmf(period);
    if period == 0 {
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        return IndicatorSeries::all_undefined(indicator_type, &dates);
    }

    let flows: Vec<f64> = bars
        .iter()
        .map(|b| b.money_flow_multiplier() * b.volume)
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return IndicatorPoint::undefined(bar.date);
            }
            let start = i + 1 - period;
            let flow_sum: f64 = flows[start..=i].iter().sum();
            let volume_sum: f64 = bars[start..=i].iter().map(|b| b.volume).sum();
            let cmf = if volume_sum == 0.0 {
                0.0
            } else {
                flow_sum / volume_sum
            };
            IndicatorPoint::defined(bar.date, cmf)
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn cmf_closes_at_high_is_one() {
        let bars: Vec<OhlcvBar> = (1..=3).map(|d| make_bar(d, 10.0, 8.0, 10.0, 500.0)).collect();
        let series = calculate_cmf(&bars, 3);
        assert!((series.value_at(2).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cmf_volume_weighted() {
        let bars = vec![
            make_bar(1, 10.0, 8.0, 10.0, 300.0), // mfm +1
            make_bar(2, 10.0, 8.0, 8.0, 100.0),  // mfm -1
        ];
        let series = calculate_cmf(&bars, 2);
        // (300 - 100) / 400 = 0.5
        assert!((series.value_at(1).unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn cmf_zero_range_bars_contribute_zero() {
        let bars: Vec<OhlcvBar> = (1..=5)
            .map(|d| make_bar(d, 100.0, 100.0, 100.0, 1000.0))
            .collect();
        let series = calculate_cmf(&bars, 5);
        let cmf = series.value_at(4).unwrap();
        assert!(!cmf.is_nan());
        assert_eq!(cmf, 0.0);
    }

    #[test]
    fn cmf_zero_volume_window_is_zero() {
        let bars: Vec<OhlcvBar> = (1..=3).map(|d| make_bar(d, 10.0, 8.0, 9.5, 0.0)).collect();
        let series = calculate_cmf(&bars, 3);
        assert_eq!(series.value_at(2), Some(0.0));
    }

    #[test]
    fn cmf_warmup() {
        let bars: Vec<OhlcvBar> = (1..=4).map(|d| make_bar(d, 10.0, 8.0, 9.0, 100.0)).collect();
        let series = calculate_cmf(&bars, 3);
        assert!(!series.values[0].is_defined());
        assert!(!series.values[1].is_defined());
        assert!(series.values[2].is_defined());
        assert!(series.values[3].is_defined());
    }
}
