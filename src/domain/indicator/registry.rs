//! Indicator capability table, text parsing and batch computation.
//!
//! Every indicator kind is registered once in [`CAPABILITIES`] with its
//! textual name and parameter list. Specs such as `SMA(20)` or
//! `BOLLINGER(20,2)` are parsed against that table.

use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::error::{SamsignalError, Warning};
use crate::domain::indicator::bollinger::{calculate_bollinger, multiplier_x100};
use crate::domain::indicator::fibonacci::calculate_fibonacci;
use crate::domain::indicator::macd::calculate_macd;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::stddev::calculate_stddev;
use crate::domain::indicator::volume::{
    calculate_obv, calculate_volume_sma, calculate_vwap_deviation,
};
use crate::domain::indicator::{
    IndicatorSeries, IndicatorType, calculate_ema, calculate_sma,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::Series;

pub struct IndicatorCapability {
    pub name: &'static str,
    pub params: &'static [&'static str],
    build: fn(&[f64]) -> Result<IndicatorType, String>,
}

pub const CAPABILITIES: &[IndicatorCapability] = &[
    IndicatorCapability {
        name: "SMA",
        params: &["period"],
        build: build_sma,
    },
    IndicatorCapability {
        name: "EMA",
        params: &["period"],
        build: build_ema,
    },
    IndicatorCapability {
        name: "RSI",
        params: &["period"],
        build: build_rsi,
    },
    IndicatorCapability {
        name: "STDDEV",
        params: &["period"],
        build: build_stddev,
    },
    IndicatorCapability {
        name: "MACD",
        params: &["fast", "slow", "signal"],
        build: build_macd,
    },
    IndicatorCapability {
        name: "BOLLINGER",
        params: &["period", "k"],
        build: build_bollinger,
    },
    IndicatorCapability {
        name: "VOLUME_SMA",
        params: &["period"],
        build: build_volume_sma,
    },
    IndicatorCapability {
        name: "VWAP_DEV",
        params: &["period"],
        build: build_vwap_dev,
    },
    IndicatorCapability {
        name: "OBV",
        params: &[],
        build: build_obv,
    },
    IndicatorCapability {
        name: "FIB",
        params: &["period"],
        build: build_fib,
    },
];

pub fn capability(name: &str) -> Option<&'static IndicatorCapability> {
    CAPABILITIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

fn period(raw: f64) -> Result<usize, String> {
    if !raw.is_finite() || raw.fract() != 0.0 || raw < 1.0 {
        return Err(format!("period must be a positive integer, got {}", raw));
    }
    Ok(raw as usize)
}

fn build_sma(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Sma(period(p[0])?))
}

fn build_ema(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Ema(period(p[0])?))
}

fn build_rsi(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Rsi(period(p[0])?))
}

fn build_stddev(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Stddev(period(p[0])?))
}

fn build_macd(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Macd {
        fast: period(p[0])?,
        slow: period(p[1])?,
        signal: period(p[2])?,
    })
}

fn build_bollinger(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Bollinger {
        period: period(p[0])?,
        stddev_mult_x100: multiplier_x100(p[1])?,
    })
}

fn build_volume_sma(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::VolumeSma(period(p[0])?))
}

fn build_vwap_dev(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::VwapDeviation(period(p[0])?))
}

fn build_obv(_: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Obv)
}

fn build_fib(p: &[f64]) -> Result<IndicatorType, String> {
    Ok(IndicatorType::Fibonacci(period(p[0])?))
}

impl FromStr for IndicatorType {
    type Err = String;

    /// Parse `NAME`, `NAME()` or `NAME(p1,p2,...)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, args) = match s.find('(') {
            Some(open) => {
                let inner = s[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| format!("missing closing parenthesis in '{}'", s))?;
                (s[..open].trim(), inner.trim())
            }
            None => (s, ""),
        };

        let cap = capability(name).ok_or_else(|| format!("unknown indicator '{}'", name))?;

        let params = if args.is_empty() {
            Vec::new()
        } else {
            args.split(',')
                .map(|a| {
                    a.trim()
                        .parse::<f64>()
                        .map_err(|_| format!("invalid parameter '{}' in '{}'", a.trim(), s))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        if params.len() != cap.params.len() {
            return Err(format!(
                "{} takes {} parameter(s) ({}), got {}",
                cap.name,
                cap.params.len(),
                cap.params.join(", "),
                params.len()
            ));
        }

        (cap.build)(&params)
    }
}

/// Run the calculator for `indicator_type` over `bars`.
pub fn calculate(bars: &[OhlcvBar], indicator_type: &IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(n) => calculate_sma(bars, *n),
        IndicatorType::Ema(n) => calculate_ema(bars, *n),
        IndicatorType::Rsi(n) => calculate_rsi(bars, *n),
        IndicatorType::Stddev(n) => calculate_stddev(bars, *n),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, *fast, *slow, *signal),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(bars, *period, *stddev_mult_x100),
        IndicatorType::VolumeSma(n) => calculate_volume_sma(bars, *n),
        IndicatorType::VwapDeviation(n) => calculate_vwap_deviation(bars, *n),
        IndicatorType::Obv => calculate_obv(bars),
        IndicatorType::Fibonacci(n) => calculate_fibonacci(bars, *n),
    }
}

/// Reject a request whose periods cannot be satisfied by a series of `len` bars.
pub fn validate_request(indicator_type: &IndicatorType, len: usize) -> Result<(), SamsignalError> {
    let name = indicator_type.to_string();
    for p in indicator_type.periods() {
        if p == 0 {
            return Err(SamsignalError::invalid(
                "indicators",
                &name,
                "period must be positive",
            ));
        }
        if p >= len {
            return Err(SamsignalError::invalid(
                "indicators",
                &name,
                format!("period {} must be less than series length {}", p, len),
            ));
        }
    }
    Ok(())
}

/// Indicator results for one series, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSet {
    pub series: Vec<IndicatorSeries>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

impl IndicatorSet {
    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series
            .iter()
            .find(|s| &s.indicator_type == indicator_type)
    }
}

/// Compute a single indicator over a validated series.
pub fn compute_indicator(
    series: &Series,
    indicator_type: &IndicatorType,
) -> Result<IndicatorSeries, SamsignalError> {
    validate_request(indicator_type, series.len())?;
    Ok(calculate(series.bars(), indicator_type))
}

/// Compute several indicators in parallel.
///
/// Duplicate requests are computed once. Every request is validated before
/// any work starts; an indicator that comes back all-absent adds an
/// `InsufficientData` warning.
pub fn compute_indicators(
    series: &Series,
    requests: &[IndicatorType],
) -> Result<IndicatorSet, SamsignalError> {
    let mut unique: Vec<&IndicatorType> = Vec::with_capacity(requests.len());
    for request in requests {
        if !unique.contains(&request) {
            unique.push(request);
        }
    }
    for request in &unique {
        validate_request(request, series.len())?;
    }

    let computed: Vec<IndicatorSeries> = unique
        .par_iter()
        .map(|t| calculate(series.bars(), t))
        .collect();

    let warnings = computed
        .iter()
        .filter(|s| s.is_all_absent())
        .map(|s| {
            let warning = Warning::InsufficientData {
                indicator: s.name(),
                bars: series.len(),
                required: s.indicator_type.warmup() + 1,
            };
            tracing::warn!(%warning, "indicator has no values");
            warning
        })
        .collect();

    tracing::debug!(count = computed.len(), bars = series.len(), "computed indicators");

    Ok(IndicatorSet {
        series: computed,
        warnings,
    })
}
