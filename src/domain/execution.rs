//! Fill simulation: slippage, sizing, commissions and cash settlement.
//!
//! Fills happen at the bar close adjusted by slippage against the trader.
//! Percentages (`commission_pct`, `slippage_pct`) are in percent, so 0.1
//! means 0.1%.

use chrono::NaiveDate;

use super::portfolio::{Portfolio, SkipReason};
use super::position::{ExitReason, Position, Side, Trade};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionConfig {
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Fraction of current equity committed per entry.
    FixedFraction(f64),
    /// Fixed number of units per entry.
    FixedQuantity(i64),
}

impl Default for Sizing {
    fn default() -> Self {
        Sizing::FixedFraction(0.25)
    }
}

/// Calculate commission: flat_fee + (trade_value * pct / 100).
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    config.commission_per_trade + (trade_value * config.commission_pct / 100.0)
}

/// Entry fill: buys pay up, short sales receive less.
pub fn entry_fill_price(side: Side, market_price: f64, slippage_pct: f64) -> f64 {
    match side {
        Side::Long => market_price * (1.0 + slippage_pct / 100.0),
        Side::Short => market_price * (1.0 - slippage_pct / 100.0),
    }
}

/// Exit fill: sales receive less, buy-to-cover pays up.
pub fn exit_fill_price(side: Side, market_price: f64, slippage_pct: f64) -> f64 {
    match side {
        Side::Long => market_price * (1.0 - slippage_pct / 100.0),
        Side::Short => market_price * (1.0 + slippage_pct / 100.0),
    }
}

/// Whole units for an order at `price`; zero when nothing fits.
pub fn order_quantity(sizing: Sizing, equity: f64, price: f64) -> i64 {
    match sizing {
        Sizing::FixedFraction(fraction) => {
            if equity <= 0.0 || price <= 0.0 {
                0
            } else {
                (equity * fraction / price).floor() as i64
            }
        }
        Sizing::FixedQuantity(quantity) => quantity.max(0),
    }
}

/// Open a position from flat.
///
/// 1. Apply slippage to the close
/// 2. Size the order (whole units only)
/// 3. Reject when the notional exceeds `leverage_cap` × equity
/// 4. Longs need notional + commission in cash; shorts are credited the
///    proceeds and only need the commission
/// 5. Settle cash and store the position
#[allow(clippy::too_many_arguments)]
pub fn enter_position(
    portfolio: &mut Portfolio,
    side: Side,
    market_price: f64,
    index: usize,
    date: NaiveDate,
    sizing: Sizing,
    leverage_cap: f64,
    config: &ExecutionConfig,
) -> Result<(), SkipReason> {
    let execution_price = entry_fill_price(side, market_price, config.slippage_pct);
    let equity = portfolio.equity(market_price);

    let quantity = order_quantity(sizing, equity, execution_price);
    if quantity <= 0 {
        return Err(SkipReason::ZeroQuantity);
    }

    let notional = quantity as f64 * execution_price;
    let commission = calculate_commission(notional, config);

    if notional > leverage_cap * equity {
        return Err(SkipReason::LeverageCap);
    }

    match side {
        Side::Long => {
            if notional + commission > portfolio.cash {
                return Err(SkipReason::InsufficientCash);
            }
            portfolio.cash -= notional + commission;
        }
        Side::Short => {
            if commission > portfolio.cash {
                return Err(SkipReason::InsufficientCash);
            }
            portfolio.cash += notional - commission;
        }
    }

    portfolio.position = Some(Position {
        side,
        quantity,
        average_entry_price: execution_price,
        entry_index: index,
        entry_date: date,
        entry_commission: commission,
    });

    Ok(())
}

/// Close the open position, if any, and record the trade.
///
/// PnL is net of both commissions.
pub fn exit_position(
    portfolio: &mut Portfolio,
    market_price: f64,
    index: usize,
    date: NaiveDate,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.position.take()?;

    let exit_price = exit_fill_price(position.side, market_price, config.slippage_pct);
    let exit_value = position.quantity as f64 * exit_price;
    let exit_commission = calculate_commission(exit_value, config);

    match position.side {
        Side::Long => portfolio.cash += exit_value - exit_commission,
        Side::Short => portfolio.cash -= exit_value + exit_commission,
    }

    let price_pnl = position.side.sign()
        * position.quantity as f64
        * (exit_price - position.average_entry_price);
    let commission = position.entry_commission + exit_commission;

    let trade = Trade {
        side: position.side,
        quantity: position.quantity,
        entry_index: position.entry_index,
        exit_index: index,
        entry_date: position.entry_date,
        exit_date: date,
        entry_price: position.average_entry_price,
        exit_price,
        commission,
        pnl: price_pnl - commission,
        exit_reason: reason,
    };

    portfolio.record_trade(trade.clone());
    Some(trade)
}
