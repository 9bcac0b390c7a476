//! Bar builders shared by unit tests.

use chrono::{Duration, NaiveDate};

use crate::domain::ohlcv::OhlcvBar;

pub(crate) fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

/// Flat bars (open = high = low = close) on consecutive days.
pub(crate) fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: day(i),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

/// Bars with an explicit high/low range around each close.
pub(crate) fn make_hlc_bars(rows: &[(f64, f64, f64)]) -> Vec<OhlcvBar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| OhlcvBar {
            date: day(i),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

pub(crate) fn with_volumes(mut bars: Vec<OhlcvBar>, volumes: &[i64]) -> Vec<OhlcvBar> {
    for (bar, &v) in bars.iter_mut().zip(volumes) {
        bar.volume = v;
    }
    bars
}
