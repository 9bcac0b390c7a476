//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars.

use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let mut series = IndicatorSeries::absent(indicator_type, bars.len());
    if fast == 0 || slow == 0 || signal_period == 0 {
        return series;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_of(&closes, fast);
    let ema_slow = ema_of(&closes, slow);

    let line_start = fast.max(slow) - 1;
    if closes.len() <= line_start {
        return series;
    }

    let line: Vec<f64> = (line_start..closes.len())
        .filter_map(|i| Some(ema_fast[i]? - ema_slow[i]?))
        .collect();
    let signal = ema_of(&line, signal_period);

    for (offset, (macd, sig)) in line.iter().zip(signal).enumerate() {
        if let Some(sig) = sig {
            series.values[line_start + offset] = Some(IndicatorValue::Macd {
                line: *macd,
                signal: sig,
                histogram: macd - sig,
            });
        }
    }

    series
}
