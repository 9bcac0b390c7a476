//! Position and closed-trade records for one simulation run.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::direction::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 long, -1 short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// The signal direction that opens this side.
    pub fn direction(self) -> Direction {
        match self {
            Side::Long => Direction::Bullish,
            Side::Short => Direction::Bearish,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub side: Side,
    /// Whole units, always positive.
    pub quantity: i64,
    pub average_entry_price: f64,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    /// Signed holding value: positive for longs, negative for shorts.
    pub fn market_value(&self, price: f64) -> f64 {
        self.side.sign() * self.quantity as f64 * price
    }

    pub fn notional(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * self.quantity as f64 * (price - self.average_entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The signal turned to the opposite direction.
    Reversal,
    /// Signal strength fell below the exit threshold.
    SignalFaded,
    EndOfData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub quantity: i64,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Round-trip commission.
    pub commission: f64,
    /// Net of commission.
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
