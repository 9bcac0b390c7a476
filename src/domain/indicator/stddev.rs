//! Rolling standard deviation of closes.
//!
//! Population standard deviation (divides by N, not N-1), the same figure
//! Bollinger Bands use. Warmup: first (n-1) bars are absent.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values: rolling_stddev(&closes, period)
            .into_iter()
            .map(|v| v.map(|(_, sd)| IndicatorValue::simple(sd)))
            .collect(),
    }
}

/// Trailing (mean, population stddev) over `period` samples.
pub(crate) fn rolling_stddev(samples: &[f64], period: usize) -> Vec<Option<(f64, f64)>> {
    if period == 0 {
        return vec![None; samples.len()];
    }
    (0..samples.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &samples[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|x| {
                    let diff = x - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            Some((mean, variance.sqrt()))
        })
        .collect()
}
