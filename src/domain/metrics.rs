//! Performance metrics for one backtest run.
//!
//! Returns are per equity point (one per bar). Sharpe and Sortino use the
//! population standard deviation and are scaled by `annualization_factor`
//! (√252 for daily bars); a zero deviation yields 0.

use serde::Serialize;

use super::portfolio::EquityPoint;
use super::position::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Longest run of equity points below the running peak.
    pub max_drawdown_duration: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    /// Gross wins / gross losses; infinite when there are wins and no losses.
    #[serde(serialize_with = "serialize_ratio")]
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Mean bars held per closed trade.
    pub avg_trade_duration: f64,
}

/// JSON has no infinity; an unbounded ratio is written as `null`.
fn serialize_ratio<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

impl Metrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_capital: f64,
        annualization_factor: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_equity = equity_curve.last().map_or(initial_capital, |p| p.equity);
        let total_return = ratio(final_equity - initial_capital, initial_capital);

        // One equity point per bar, so a year is factor² points.
        let periods_per_year = annualization_factor * annualization_factor;
        let years = ratio(equity_curve.len() as f64, periods_per_year);
        let annualized_return = if years > 0.0 && total_return > -1.0 && total_return.is_finite()
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(
            equity_curve,
            ratio(risk_free_rate, periods_per_year),
            annualization_factor,
        );

        let stats = TradeStats::from_trades(trades);
        let closed = trades.len() as f64;

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            trades_won: stats.won,
            trades_lost: stats.lost,
            trades_breakeven: trades.len() - stats.won - stats.lost,
            win_rate: ratio(stats.won as f64, closed),
            profit_factor: stats.profit_factor(),
            avg_win: ratio(stats.gross_win, stats.won as f64),
            avg_loss: ratio(stats.gross_loss, stats.lost as f64),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            avg_trade_duration: ratio(stats.bars_held as f64, closed),
        }
    }
}

/// `num / den`, or 0 when the denominator is not positive.
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Win/loss tallies over closed trades. Losses are stored as magnitudes.
#[derive(Default)]
struct TradeStats {
    won: usize,
    lost: usize,
    gross_win: f64,
    gross_loss: f64,
    largest_win: f64,
    largest_loss: f64,
    bars_held: usize,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        trades.iter().fold(TradeStats::default(), |mut stats, trade| {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                stats.won += 1;
                stats.gross_win += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.gross_loss -= pnl;
                stats.largest_loss = stats.largest_loss.max(-pnl);
            }
            stats.bars_held += trade.bars_held();
            stats
        })
    }

    fn profit_factor(&self) -> f64 {
        match (self.gross_win > 0.0, self.gross_loss > 0.0) {
            (_, true) => self.gross_win / self.gross_loss,
            (true, false) => f64::INFINITY,
            (false, false) => 0.0,
        }
    }
}

/// Largest peak-to-trough fraction and the longest underwater stretch.
pub(crate) fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut underwater = 0usize;
    let mut worst = (0.0_f64, 0usize);

    for equity in equity_curve.iter().map(|p| p.equity) {
        if equity >= peak {
            peak = equity;
            underwater = 0;
            continue;
        }
        underwater += 1;
        worst.0 = worst.0.max(ratio(peak - equity, peak));
        worst.1 = worst.1.max(underwater);
    }

    worst
}

/// Point-to-point simple returns; a non-positive base yields 0.
fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| ratio(w[1].equity - w[0].equity, w[0].equity))
        .collect()
}

/// Annualized (Sharpe, Sortino). Both are 0 with fewer than two points.
pub(crate) fn compute_risk_adjusted(
    equity_curve: &[EquityPoint],
    period_rf: f64,
    annualization_factor: f64,
) -> (f64, f64) {
    let returns = period_returns(equity_curve);
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let excess = mean - period_rf;

    let deviation = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    let downside = (returns
        .iter()
        .map(|r| (r - period_rf).min(0.0).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    (
        ratio(excess, deviation) * annualization_factor,
        ratio(excess, downside) * annualization_factor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{ExitReason, Side};
    use crate::domain::testing::day;

    const DAILY: f64 = 15.874_507_866_387_544; // sqrt(252)

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(index, &equity)| EquityPoint {
                index,
                date: day(index),
                equity,
            })
            .collect()
    }

    fn closed(pnl: f64, bars: usize) -> Trade {
        let entry_date = day(0);
        Trade {
            side: Side::Long,
            quantity: 100,
            entry_index: 0,
            exit_index: bars,
            entry_date,
            exit_date: day(bars),
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 100.0,
            commission: 0.0,
            pnl,
            exit_reason: ExitReason::SignalFaded,
        }
    }

    fn compute(equity: &[f64], trades: &[Trade]) -> Metrics {
        let initial = equity.first().copied().unwrap_or(100_000.0);
        Metrics::compute(&curve(equity), trades, initial, DAILY, 0.0)
    }

    #[test]
    fn empty_run_reports_initial_capital() {
        let metrics = Metrics::compute(&[], &[], 100_000.0, DAILY, 0.05);
        assert!(metrics.total_return.abs() < f64::EPSILON);
        assert!((metrics.final_equity - 100_000.0).abs() < f64::EPSILON);
        assert_eq!(metrics.trades_won + metrics.trades_lost, 0);
        assert!(metrics.sharpe_ratio.abs() < f64::EPSILON);
        assert!(metrics.profit_factor.abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_total_return() {
        assert!((compute(&[100_000.0, 110_000.0], &[]).total_return - 0.10).abs() < 1e-9);
        assert!((compute(&[100_000.0, 90_000.0], &[]).total_return + 0.10).abs() < 1e-9);
    }

    #[test]
    fn metrics_annualized_return_over_one_year() {
        let mut values = vec![100_000.0; 251];
        values.push(110_000.0);
        let metrics = compute(&values, &[]);
        assert!((metrics.annualized_return - 0.10).abs() < 1e-9);
    }

    #[test]
    fn trade_stats_split_wins_losses_and_flat() {
        let trades = vec![
            closed(100.0, 5),
            closed(-50.0, 3),
            closed(200.0, 10),
            closed(0.0, 1),
        ];
        let metrics = compute(&[100_000.0, 100_250.0], &trades);

        assert_eq!(
            (metrics.trades_won, metrics.trades_lost, metrics.trades_breakeven),
            (2, 1, 1)
        );
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((metrics.profit_factor - 6.0).abs() < 1e-9);
        assert!((metrics.avg_win - 150.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 50.0).abs() < 1e-9);
        assert!((metrics.largest_win - 200.0).abs() < 1e-9);
        assert!((metrics.largest_loss - 50.0).abs() < 1e-9);
        assert!((metrics.avg_trade_duration - 4.75).abs() < 1e-9);
    }

    #[test]
    fn profit_factor_without_losses_is_unbounded() {
        let metrics = compute(&[100.0, 101.0], &[closed(1.0, 1)]);
        assert!(metrics.profit_factor.is_infinite());
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["profit_factor"].is_null());
    }

    #[test]
    fn drawdown_is_peak_to_trough_fraction() {
        let curve = curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        let (dd, _) = compute_drawdown(&curve);
        assert!((dd - (110.0 - 80.0) / 110.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_duration_counts_underwater_points() {
        let curve = curve(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]);
        let (_, duration) = compute_drawdown(&curve);
        assert_eq!(duration, 4);
    }

    #[test]
    fn monotonic_equity_has_no_drawdown() {
        let curve = curve(&[100.0, 100.0, 101.0, 103.0]);
        assert_eq!(compute_drawdown(&curve), (0.0, 0));
    }

    #[test]
    fn sharpe_uses_population_deviation() {
        // returns +10%, -10%: mean 0 → sharpe 0
        let curve = curve(&[100.0, 110.0, 99.0]);
        let (sharpe, _) = compute_risk_adjusted(&curve, 0.0, 1.0);
        assert!(sharpe.abs() < 1e-12);

        // returns 0.1 and 0.0: mean 0.05, population sd 0.05 → 1.0
        let curve = self::curve(&[100.0, 110.0, 110.0]);
        let (sharpe, sortino) = compute_risk_adjusted(&curve, 0.0, 1.0);
        assert!((sharpe - 1.0).abs() < 1e-9);
        assert!((sortino - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_equity_gives_zero_ratios() {
        let curve = curve(&[100.0; 10]);
        assert_eq!(compute_risk_adjusted(&curve, 0.0, DAILY), (0.0, 0.0));
    }

    #[test]
    fn sortino_is_finite_with_losses() {
        let curve = curve(&[100.0, 101.0, 100.5, 101.5, 100.0, 102.0]);
        let (sharpe, sortino) = compute_risk_adjusted(&curve, 0.0, DAILY);
        assert!(sharpe.is_finite());
        assert!(sortino.is_finite());
        assert!(sortino > 0.0);
    }
}
