//! Indicator calculators and the values they produce.
//!
//! An [`IndicatorType`] names one indicator with its parameters and prints as
//! `NAME(p1,p2)`. Each [`IndicatorSeries`] is aligned 1:1 with the bars, with
//! warmup entries stored as `None`.
//!
//! Calculators never fail: a series too short for the requested period comes
//! back with every entry absent. Period validation happens in [`registry`].

pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod macd;
pub mod registry;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volume;

pub use ema::calculate_ema;
pub use sma::calculate_sma;

use serde::Serialize;
use std::fmt;

/// Retracement ratios reported by the Fibonacci indicator, top to bottom.
pub const FIB_RATIOS: [f64; 6] = [0.0, 0.236, 0.382, 0.5, 0.618, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum IndicatorValue {
    Simple {
        value: f64,
    },
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Fibonacci {
        levels: [f64; 6],
    },
}

impl IndicatorValue {
    pub fn simple(value: f64) -> Self {
        IndicatorValue::Simple { value }
    }

    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple { value } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Stddev(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    VolumeSma(usize),
    VwapDeviation(usize),
    Obv,
    Fibonacci(usize),
}

impl IndicatorType {
    /// Number of leading entries that are always absent.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Stddev(n)
            | IndicatorType::VolumeSma(n)
            | IndicatorType::VwapDeviation(n)
            | IndicatorType::Fibonacci(n) => n.saturating_sub(1),
            IndicatorType::Bollinger { period, .. } => period.saturating_sub(1),
            IndicatorType::Rsi(n) => *n,
            IndicatorType::Macd { fast, slow, signal } => {
                (*fast).max(*slow).saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorType::Obv => 0,
        }
    }

    /// Every period parameter of this indicator.
    pub fn periods(&self) -> Vec<usize> {
        match self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Rsi(n)
            | IndicatorType::Stddev(n)
            | IndicatorType::VolumeSma(n)
            | IndicatorType::VwapDeviation(n)
            | IndicatorType::Fibonacci(n) => vec![*n],
            IndicatorType::Bollinger { period, .. } => vec![*period],
            IndicatorType::Macd { fast, slow, signal } => vec![*fast, *slow, *signal],
            IndicatorType::Obv => vec![],
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::VwapDeviation(period) => write!(f, "VWAP_DEV({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Fibonacci(period) => write!(f, "FIB({})", period),
        }
    }
}

impl From<IndicatorType> for String {
    fn from(t: IndicatorType) -> Self {
        t.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    #[serde(rename = "name")]
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<IndicatorValue>>,
}

impl IndicatorSeries {
    /// A series of `len` absent values.
    pub fn absent(indicator_type: IndicatorType, len: usize) -> Self {
        IndicatorSeries {
            indicator_type,
            values: vec![None; len],
        }
    }

    pub fn name(&self) -> String {
        self.indicator_type.to_string()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorValue> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    /// Scalar value at `index`; `None` in warmup or for multi-field indicators.
    pub fn simple(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(IndicatorValue::as_simple)
    }

    pub fn first_present(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn is_all_absent(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}
