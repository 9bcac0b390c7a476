//! Domain error and warning types.
//!
//! Only validation and configuration errors abort a run. Everything else is
//! reported as a [`Warning`] next to the normal output.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Top-level error type for samsignal.
#[derive(Debug, thiserror::Error)]
pub enum SamsignalError {
    #[error("series is empty")]
    EmptySeries,

    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    NonMonotonicDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("bar {index} ({date}) is malformed: {reason}")]
    InvalidBar {
        index: usize,
        date: NaiveDate,
        reason: String,
    },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("unknown config section [{section}]")]
    ConfigUnknownSection { section: String },

    #[error("unknown config key [{section}] {key}")]
    ConfigUnknownKey { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SamsignalError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SamsignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SamsignalError::EmptySeries
                | SamsignalError::NonMonotonicDate { .. }
                | SamsignalError::InvalidBar { .. }
                | SamsignalError::InsufficientData { .. }
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SamsignalError::ConfigParse { .. }
                | SamsignalError::ConfigUnknownSection { .. }
                | SamsignalError::ConfigUnknownKey { .. }
                | SamsignalError::ConfigInvalid { .. }
        )
    }
}

impl From<&SamsignalError> for std::process::ExitCode {
    fn from(err: &SamsignalError) -> Self {
        let code: u8 = match err {
            SamsignalError::Io(_) | SamsignalError::Report { .. } => 1,
            SamsignalError::ConfigParse { .. }
            | SamsignalError::ConfigUnknownSection { .. }
            | SamsignalError::ConfigUnknownKey { .. }
            | SamsignalError::ConfigInvalid { .. } => 2,
            SamsignalError::DataSource { .. } => 3,
            SamsignalError::EmptySeries
            | SamsignalError::NonMonotonicDate { .. }
            | SamsignalError::InvalidBar { .. }
            | SamsignalError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// A recoverable condition reported alongside normal output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An indicator could not produce any value over the series.
    InsufficientData {
        indicator: String,
        bars: usize,
        required: usize,
    },
    /// Two consecutive bars are further apart than the sampling interval allows.
    SeriesGap {
        index: usize,
        from: NaiveDate,
        to: NaiveDate,
        days: i64,
    },
    /// A stage was cancelled and returned a partial result.
    Incomplete { stage: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientData {
                indicator,
                bars,
                required,
            } => write!(
                f,
                "{indicator} needs {required} bars, series has {bars}; values marked absent"
            ),
            Warning::SeriesGap {
                index,
                from,
                to,
                days,
            } => write!(f, "gap of {days} days before bar {index} ({from} -> {to})"),
            Warning::Incomplete { stage } => write!(f, "{stage} cancelled; result is partial"),
        }
    }
}
