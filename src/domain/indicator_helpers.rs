//! Batch indicator computation with corrupt-bar masking.

use crate::domain::indicator::cmf::calculate_cmf;
use crate::domain::indicator::rolling::{calculate_lowest_low, calculate_shifted_high};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::HashMap;

pub fn calculate(bars: &[OhlcvBar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(n) => calculate_sma(bars, n),
        IndicatorType::VolumeSma(n) => calculate_volume_sma(bars, n),
        IndicatorType::ShiftedHigh(n) => calculate_shifted_high(bars, n),
        IndicatorType::LowestLow(n) => calculate_lowest_low(bars, n),
        IndicatorType::Rsi(n) => calculate_rsi(bars, n),
        IndicatorType::Cmf(n) => calculate_cmf(bars, n),
    }
}

/// Compute every requested indicator over `bars`.
///
/// Any value whose input window touches a corrupt bar is left undefined, so a
/// single bad row degrades only the values that depend on it.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let corrupt_prefix = corrupt_prefix_counts(bars);

    types
        .iter()
        .map(|&t| {
            let mut series = calculate(bars, t);
            mask_corrupt_windows(&mut series, &corrupt_prefix, t.span());
            (t, series)
        })
        .collect()
}

/// `prefix[i]` = number of corrupt bars in `bars[..i]`.
fn corrupt_prefix_counts(bars: &[OhlcvBar]) -> Vec<usize> {
    let mut prefix = Vec::with_capacity(bars.len() + 1);
    prefix.push(0);
    let mut count = 0;
    for bar in bars {
        if bar.is_corrupt() {
            count += 1;
        }
        prefix.push(count);
    }
    prefix
}

fn mask_corrupt_windows(series: &mut IndicatorSeries, corrupt_prefix: &[usize], span: usize) {
    if corrupt_prefix.last().copied().unwrap_or(0) == 0 {
        return;
    }
    for (i, point) in series.values.iter_mut().enumerate() {
        let start = (i + 1).saturating_sub(span.max(1));
        if corrupt_prefix[i + 1] - corrupt_prefix[start] > 0 {
            point.value = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: i64, close: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn computes_all_requested_types() {
        let bars: Vec<OhlcvBar> = (0..30).map(|i| make_bar(i, 100.0 + i as f64)).collect();
        let types = [
            IndicatorType::Sma(20),
            IndicatorType::VolumeSma(20),
            IndicatorType::ShiftedHigh(20),
            IndicatorType::Rsi(14),
            IndicatorType::Cmf(20),
        ];
        let map = compute_indicators(&bars, &types);

        assert_eq!(map.len(), 5);
        for t in &types {
            assert_eq!(map[t].values.len(), 30);
            assert_eq!(map[t].indicator_type, *t);
        }
    }

    #[test]
    fn corrupt_bar_masks_only_dependent_values() {
        let mut bars: Vec<OhlcvBar> = (0..30).map(|i| make_bar(i, 100.0)).collect();
        bars[10].high = 50.0; // high < low
        let map = compute_indicators(&bars, &[IndicatorType::Sma(5)]);
        let sma = &map[&IndicatorType::Sma(5)];

        assert!(sma.value_at(9).is_some());
        for i in 10..15 {
            assert_eq!(sma.value_at(i), None, "bar {} should be masked", i);
        }
        assert!(sma.value_at(15).is_some());
    }

    #[test]
    fn corrupt_bar_masks_its_own_shifted_high() {
        let mut bars: Vec<OhlcvBar> = (0..30).map(|i| make_bar(i, 100.0)).collect();
        bars[25].volume = -5.0;
        let map = compute_indicators(&bars, &[IndicatorType::ShiftedHigh(3)]);
        let high = &map[&IndicatorType::ShiftedHigh(3)];

        assert!(high.value_at(24).is_some());
        assert_eq!(high.value_at(25), None);
        assert_eq!(high.value_at(28), None);
        assert!(high.value_at(29).is_some());
    }

    #[test]
    fn clean_series_is_untouched() {
        let bars: Vec<OhlcvBar> = (0..10).map(|i| make_bar(i, 100.0)).collect();
        let map = compute_indicators(&bars, &[IndicatorType::Sma(3)]);
        let sma = &map[&IndicatorType::Sma(3)];
        assert_eq!(sma.values.iter().filter(|p| p.is_defined()).count(), 8);
    }
}
