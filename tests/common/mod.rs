#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use samsignal::domain::error::SamsignalError;
pub use samsignal::domain::ohlcv::OhlcvBar;
use samsignal::domain::series::{DEFAULT_MAX_GAP_DAYS, Series};
use samsignal::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<OhlcvBar>, SamsignalError> {
        match &self.error {
            Some(reason) => Err(SamsignalError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(self.bars.clone()),
        }
    }
}

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

/// One bar per day with a 1-point range around the close.
pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
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

pub fn make_series(closes: &[f64]) -> Series {
    Series::new(make_bars(closes), DEFAULT_MAX_GAP_DAYS).unwrap()
}

/// 100, 101, 102, ...
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

pub fn flat_closes(n: usize) -> Vec<f64> {
    vec![100.0; n]
}

/// Choppy but deterministic prices with real swings.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t / 6.0).sin() + 3.0 * (t / 2.3).cos() + 0.05 * t
        })
        .collect()
}

/// Bars with a high/low range so pivots and bands have something to work with.
pub fn ranged_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: day(i),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000 + ((i * 37) % 500) as i64,
        })
        .collect()
}

pub fn csv_text(bars: &[OhlcvBar]) -> String {
    let mut text = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        text.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    text
}
