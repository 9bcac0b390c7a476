//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is also 0 (flat), then 50.
//!
//! Warmup: first n bars are absent (n price changes are needed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::absent(IndicatorType::Rsi(period), bars.len());
    if period == 0 || bars.len() <= period {
        return series;
    }

    let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
    series.values[period] = Some(IndicatorValue::simple(rsi_value(avg_gain, avg_loss)));

    for i in (period + 1)..bars.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        series.values[i] = Some(IndicatorValue::simple(rsi_value(avg_gain, avg_loss)));
    }

    series
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        (100.0 - (100.0 / (1.0 + avg_gain / avg_loss))).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::make_bars;

    #[test]
    fn rsi_warmup() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0]);
        let series = calculate_rsi(&bars, 3);

        for i in 0..3 {
            assert!(series.get(i).is_none(), "index {} should be absent", i);
        }
        assert!(series.get(3).is_some());
        assert!(series.get(5).is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let series = calculate_rsi(&bars, 3);
        for i in 3..6 {
            assert!((series.simple(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let bars = make_bars(&[6.0, 5.0, 4.0, 3.0, 2.0]);
        let series = calculate_rsi(&bars, 3);
        assert!(series.simple(3).unwrap().abs() < f64::EPSILON);
        assert!(series.simple(4).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_is_50() {
        let bars = make_bars(&[100.0; 20]);
        let series = calculate_rsi(&bars, 14);
        for i in 14..20 {
            assert!((series.simple(i).unwrap() - 50.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rsi_seed_and_wilder_smoothing() {
        // changes: +2, -1, +1, -2
        let bars = make_bars(&[10.0, 12.0, 11.0, 12.0, 10.0]);
        let series = calculate_rsi(&bars, 3);

        let avg_gain = 3.0 / 3.0;
        let avg_loss = 1.0 / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((series.simple(3).unwrap() - expected).abs() < 1e-12);

        let avg_gain = (avg_gain * 2.0 + 0.0) / 3.0;
        let avg_loss = (avg_loss * 2.0 + 2.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((series.simple(4).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn rsi_short_series_all_absent() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let series = calculate_rsi(&bars, 3);
        assert_eq!(series.len(), 3);
        assert!(series.is_all_absent());
    }
}
