//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are absent.

use crate::domain::indicator::stddev::rolling_stddev;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

/// The band multiplier `k` in hundredths.
///
/// `k` must be positive and carry at most two decimal places, since bands
/// are keyed by the integer hundredths value.
pub fn multiplier_x100(k: f64) -> Result<u32, String> {
    if !k.is_finite() || k <= 0.0 {
        return Err(format!("band multiplier must be positive, got {}", k));
    }
    let scaled = k * 100.0;
    let rounded = scaled.round();
    if (scaled - rounded).abs() > 1e-6 {
        return Err(format!("band multiplier {} has more than two decimal places", k));
    }
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return Err(format!("band multiplier {} is out of range", k));
    }
    Ok(rounded as u32)
}

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let values = rolling_stddev(&closes, period)
        .into_iter()
        .map(|point| {
            point.map(|(middle, sd)| IndicatorValue::Bands {
                upper: middle + mult * sd,
                middle,
                lower: middle - mult * sd,
            })
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
