//! Rolling extremes used as breakout reference and swing stop.
//!
//! ShiftedHigh(n)[i] = max(high[i-n..i])   (current bar excluded)
//! LowestLow(n)[i]   = min(low[i-n+1..=i]) (current bar included)
//!
//! The shifted high only ever looks at bars before `i`, so a bar's own
//! extreme can never count toward its own breakout.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_shifted_high(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::ShiftedHigh(period);
    if period == 0 {
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        return IndicatorSeries::all_undefined(indicator_type, &dates);
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < period {
                return IndicatorPoint::undefined(bar.date);
            }
            let highest = bars[i - period..i]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            IndicatorPoint::defined(bar.date, highest)
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_lowest_low(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::LowestLow(period);
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
            let lowest = bars[i + 1 - period..=i]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);
            IndicatorPoint::defined(bar.date, lowest)
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

    fn make_bar(day: u32, high: f64, low: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: low,
            high,
            low,
            close: (high + low) / 2.0,
            volume: 1000.0,
        }
    }

    #[test]
    fn shifted_high_excludes_current_bar() {
        let bars = vec![
            make_bar(1, 10.0, 5.0),
            make_bar(2, 12.0, 6.0),
            make_bar(3, 11.0, 7.0),
            make_bar(4, 50.0, 8.0),
        ];
        let series = calculate_shifted_high(&bars, 3);

        assert_eq!(series.value_at(2), None);
        // bars 0..3 -> max(10, 12, 11); bar 3's own 50 is not included
        assert!((series.value_at(3).unwrap() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shifted_high_unchanged_by_current_bar() {
        let mut bars: Vec<OhlcvBar> = (1..=22).map(|d| make_bar(d, 100.0, 90.0)).collect();
        let before = calculate_shifted_high(&bars, 20).value_at(21);

        bars[21].high = 500.0;
        bars[21].low = 1.0;
        let after = calculate_shifted_high(&bars, 20).value_at(21);

        assert_eq!(before, after);
    }

    #[test]
    fn shifted_high_warmup() {
        let bars: Vec<OhlcvBar> = (1..=21).map(|d| make_bar(d, 100.0, 90.0)).collect();
        let series = calculate_shifted_high(&bars, 20);
        assert!(series.values[..20].iter().all(|p| !p.is_defined()));
        assert!(series.values[20].is_defined());
    }

    #[test]
    fn lowest_low_includes_current_bar() {
        let bars = vec![
            make_bar(1, 10.0, 5.0),
            make_bar(2, 12.0, 6.0),
            make_bar(3, 11.0, 2.0),
        ];
        let series = calculate_lowest_low(&bars, 2);

        assert_eq!(series.value_at(0), None);
        assert!((series.value_at(1).unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((series.value_at(2).unwrap() - 2.0).abs() < f64::EPSILON);
    }
}
