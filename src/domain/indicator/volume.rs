//! Volume-based indicators.
//!
//! - Volume SMA: trailing mean of volume, the baseline for volume confirmation
//! - VWAP deviation: (C - VWAP) / VWAP where VWAP = Σ(TP·V) / ΣV over n bars
//! - OBV: cumulative volume signed by the close-to-close direction
//!
//! VWAP deviation is absent when the window holds no volume.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values: rolling_mean(&volumes, period)
            .into_iter()
            .map(|v| v.map(IndicatorValue::simple))
            .collect(),
    }
}

pub fn calculate_vwap_deviation(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::absent(IndicatorType::VwapDeviation(period), bars.len());
    if period == 0 {
        return series;
    }

    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];
        let volume: f64 = window.iter().map(|b| b.volume as f64).sum();
        if volume <= 0.0 {
            continue;
        }
        let vwap = window
            .iter()
            .map(|b| b.typical_price() * b.volume as f64)
            .sum::<f64>()
            / volume;
        if vwap == 0.0 {
            continue;
        }
        series.values[i] = Some(IndicatorValue::simple((bars[i].close - vwap) / vwap));
    }

    series
}

/// OBV[0] = volume[0]; then add volume on up closes, subtract on down closes.
///
/// No warmup; every bar is present.
pub fn calculate_obv(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut obv = 0.0;
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                obv = bar.volume as f64;
            } else if bar.close > bars[i - 1].close {
                obv += bar.volume as f64;
            } else if bar.close < bars[i - 1].close {
                obv -= bar.volume as f64;
            }
            Some(IndicatorValue::simple(obv))
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}
