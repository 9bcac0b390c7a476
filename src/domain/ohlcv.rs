//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns a description of the first structural problem with this bar, if any.
    pub fn defect(&self) -> Option<String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Some(format!("{name} is not a finite number"));
            }
        }
        if self.low <= 0.0 {
            return Some(format!("low {} is not a positive price", self.low));
        }
        if self.high < self.low {
            return Some(format!("high {} is below low {}", self.high, self.low));
        }
        if self.open > self.high || self.close > self.high {
            return Some("open/close above high".to_string());
        }
        if self.open < self.low || self.close < self.low {
            return Some("open/close below low".to_string());
        }
        if self.volume < 0 {
            return Some(format!("negative volume {}", self.volume));
        }
        None
    }
}
