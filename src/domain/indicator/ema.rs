//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are absent.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values: ema_of(&closes, period)
            .into_iter()
            .map(|v| v.map(IndicatorValue::simple))
            .collect(),
    }
}

/// EMA over `samples`, seeded with the SMA of the first `period` samples.
pub(crate) fn ema_of(samples: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; samples.len()];
    if period == 0 || samples.len() < period {
        return values;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = samples[..period].iter().sum::<f64>() / period as f64;
    values[period - 1] = Some(ema);

    for i in period..samples.len() {
        ema = samples[i] * k + ema * (1.0 - k);
        values[i] = Some(ema);
    }

    values
}
