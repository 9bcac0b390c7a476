//! Account state owned by a single simulation run.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::position::{Position, Side, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub index: usize,
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientCash,
    LeverageCap,
    ZeroQuantity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientCash => write!(f, "insufficient cash"),
            SkipReason::LeverageCap => write!(f, "leverage cap"),
            SkipReason::ZeroQuantity => write!(f, "zero quantity"),
        }
    }
}

/// An entry the simulator wanted but could not make.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSkip {
    pub index: usize,
    pub side: Side,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub skipped: Vec<SimulationSkip>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            trades: Vec::new(),
            skipped: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// cash + signed position value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_skip(&mut self, index: usize, side: Side, reason: SkipReason) {
        self.skipped.push(SimulationSkip {
            index,
            side,
            reason,
        });
    }

    pub fn record_equity(&mut self, index: usize, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint {
            index,
            date,
            equity,
        });
    }
}
