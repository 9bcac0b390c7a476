//! Rolling Fibonacci retracement levels.
//!
//! Over the trailing n bars, with H = max(high) and L = min(low):
//! level(r) = H - r·(H - L) for each r in [`FIB_RATIOS`].
//! Warmup: first (n-1) bars are absent.

use crate::domain::indicator::{FIB_RATIOS, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_fibonacci(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut series = IndicatorSeries::absent(IndicatorType::Fibonacci(period), bars.len());
    if period == 0 {
        return series;
    }

    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];
        let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = high - low;
        let levels = FIB_RATIOS.map(|r| high - r * range);
        series.values[i] = Some(IndicatorValue::Fibonacci { levels });
    }

    series
}
