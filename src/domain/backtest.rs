//! Signal-driven backtest simulator.
//!
//! One run replays the bars in order and reacts to the composite signal of
//! each bar:
//!
//! 1. Stop if cancelled (the partial report is marked incomplete)
//! 2. Holding: exit on an opposite signal or when strength drops below
//!    `exit_threshold`
//! 3. Flat: enter when strength reaches `entry_threshold` in a tradable
//!    direction (shorts only with `allow_shorting`); a reversal exit may
//!    re-enter the other way on the same bar
//! 4. Mark equity at the close
//!
//! An open position is closed at the last close when `close_at_end` is set.

use rayon::prelude::*;
use serde::Serialize;

use super::cancel::CancelToken;
use super::direction::Direction;
use super::error::SamsignalError;
use super::execution::{self, ExecutionConfig, Sizing};
use super::metrics::Metrics;
use super::ohlcv::OhlcvBar;
use super::portfolio::{EquityPoint, Portfolio, SimulationSkip};
use super::position::{ExitReason, Position, Side, Trade};
use super::scorer::CompositeSignal;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub sizing: Sizing,
    /// Maximum notional as a multiple of equity.
    pub leverage_cap: f64,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub allow_shorting: bool,
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub risk_free_rate: f64,
    /// Multiplier applied to per-bar Sharpe/Sortino; √252 for daily bars.
    pub annualization_factor: f64,
    pub close_at_end: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            sizing: Sizing::default(),
            leverage_cap: 1.0,
            entry_threshold: 0.15,
            exit_threshold: 0.05,
            allow_shorting: false,
            commission_per_trade: 0.0,
            commission_pct: 0.0,
            slippage_pct: 0.0,
            risk_free_rate: 0.0,
            annualization_factor: 252.0_f64.sqrt(),
            close_at_end: true,
        }
    }
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_per_trade: self.commission_per_trade,
            commission_pct: self.commission_pct,
            slippage_pct: self.slippage_pct,
        }
    }

    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), SamsignalError> {
        let positive = [
            ("initial_capital", self.initial_capital),
            ("leverage_cap", self.leverage_cap),
            ("annualization_factor", self.annualization_factor),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SamsignalError::invalid(
                    "backtest",
                    key,
                    format!("must be a positive number, got {}", value),
                ));
            }
        }

        let non_negative = [
            ("commission_per_trade", self.commission_per_trade),
            ("commission_pct", self.commission_pct),
            ("slippage_pct", self.slippage_pct),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SamsignalError::invalid(
                    "backtest",
                    key,
                    format!("must be zero or more, got {}", value),
                ));
            }
        }

        for (key, value) in [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SamsignalError::invalid(
                    "backtest",
                    key,
                    format!("must be within [0, 1], got {}", value),
                ));
            }
        }
        if self.exit_threshold > self.entry_threshold {
            return Err(SamsignalError::invalid(
                "backtest",
                "exit_threshold",
                format!(
                    "{} is above entry_threshold {}",
                    self.exit_threshold, self.entry_threshold
                ),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(SamsignalError::invalid(
                "backtest",
                "risk_free_rate",
                "must be finite",
            ));
        }

        match self.sizing {
            Sizing::FixedFraction(f) if !(f.is_finite() && f > 0.0) => Err(SamsignalError::invalid(
                "backtest",
                "sizing_value",
                format!("fraction must be positive, got {}", f),
            )),
            Sizing::FixedQuantity(q) if q <= 0 => Err(SamsignalError::invalid(
                "backtest",
                "sizing_value",
                format!("quantity must be positive, got {}", q),
            )),
            _ => Ok(()),
        }
    }

    /// Side opened by a signal strong enough to enter, if any.
    fn entry_side(&self, signal: &CompositeSignal) -> Option<Side> {
        if signal.strength < self.entry_threshold {
            return None;
        }
        match signal.direction {
            Direction::Bullish => Some(Side::Long),
            Direction::Bearish if self.allow_shorting => Some(Side::Short),
            _ => None,
        }
    }

    /// Why `position` should be closed on `signal`, if at all.
    fn exit_reason(&self, position: &Position, signal: &CompositeSignal) -> Option<ExitReason> {
        if signal.direction == position.side.direction().opposite() {
            Some(ExitReason::Reversal)
        } else if signal.strength < self.exit_threshold {
            Some(ExitReason::SignalFaded)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub skipped: Vec<SimulationSkip>,
    /// Still open when the run stopped (cancelled, or `close_at_end` off).
    pub open_position: Option<Position>,
    pub metrics: Metrics,
    /// False when the run was cancelled before the last bar.
    pub complete: bool,
}

/// Replay `bars` against `signals` (one per bar from the scorer warmup on).
pub fn run_backtest(
    bars: &[OhlcvBar],
    signals: &[CompositeSignal],
    config: &BacktestConfig,
    cancel: &CancelToken,
) -> Result<BacktestReport, SamsignalError> {
    config.validate()?;

    let mut by_index: Vec<Option<&CompositeSignal>> = vec![None; bars.len()];
    for signal in signals {
        if let Some(slot) = by_index.get_mut(signal.index) {
            *slot = Some(signal);
        }
    }

    let execution = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut complete = true;

    for (i, bar) in bars.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(bar = i, "backtest cancelled");
            complete = false;
            break;
        }

        if let Some(signal) = by_index[i] {
            let exit = portfolio
                .position
                .as_ref()
                .and_then(|pos| config.exit_reason(pos, signal));
            if let Some(reason) = exit {
                if let Some(trade) =
                    execution::exit_position(&mut portfolio, bar.close, i, bar.date, reason, &execution)
                {
                    tracing::debug!(bar = i, side = %trade.side, pnl = trade.pnl, ?reason, "exit");
                }
            }

            if portfolio.is_flat() {
                if let Some(side) = config.entry_side(signal) {
                    match execution::enter_position(
                        &mut portfolio,
                        side,
                        bar.close,
                        i,
                        bar.date,
                        config.sizing,
                        config.leverage_cap,
                        &execution,
                    ) {
                        Ok(()) => tracing::debug!(bar = i, %side, price = bar.close, "entry"),
                        Err(reason) => {
                            tracing::debug!(bar = i, %side, %reason, "entry skipped");
                            portfolio.record_skip(i, side, reason);
                        }
                    }
                }
            }
        }

        let equity = portfolio.equity(bar.close);
        portfolio.record_equity(i, bar.date, equity);
    }

    if complete && config.close_at_end {
        if let Some(last) = bars.last() {
            let i = bars.len() - 1;
            if execution::exit_position(
                &mut portfolio,
                last.close,
                i,
                last.date,
                ExitReason::EndOfData,
                &execution,
            )
            .is_some()
            {
                let equity = portfolio.cash;
                if let Some(point) = portfolio.equity_curve.last_mut() {
                    point.equity = equity;
                }
            }
        }
    }

    let metrics = Metrics::compute(
        &portfolio.equity_curve,
        &portfolio.trades,
        config.initial_capital,
        config.annualization_factor,
        config.risk_free_rate,
    );

    tracing::info!(
        bars = portfolio.equity_curve.len(),
        trades = portfolio.trades.len(),
        skipped = portfolio.skipped.len(),
        total_return = metrics.total_return,
        complete,
        "backtest finished"
    );

    Ok(BacktestReport {
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
        skipped: portfolio.skipped,
        open_position: portfolio.position,
        metrics,
        complete,
    })
}

/// Run independent configurations over the same signals in parallel.
///
/// Reports come back in the order of `configs`. Every configuration is
/// validated before any run starts.
pub fn run_sweep(
    bars: &[OhlcvBar],
    signals: &[CompositeSignal],
    configs: &[BacktestConfig],
    cancel: &CancelToken,
) -> Result<Vec<BacktestReport>, SamsignalError> {
    for config in configs {
        config.validate()?;
    }
    tracing::debug!(runs = configs.len(), "starting sweep");

    configs
        .par_iter()
        .map(|config| run_backtest(bars, signals, config, cancel))
        .collect()
}
