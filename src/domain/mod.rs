//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod cancel;
pub mod direction;
pub mod indicator;
pub mod pattern;
pub mod scorer;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod analysis;
pub mod config_validation;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;
