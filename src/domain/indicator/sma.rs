//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are absent.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: rolling_mean(&closes, period)
            .into_iter()
            .map(|v| v.map(IndicatorValue::simple))
            .collect(),
    }
}

/// Trailing mean over `period` samples; absent until the window is full.
pub(crate) fn rolling_mean(samples: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; samples.len()];
    }
    (0..samples.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &samples[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
