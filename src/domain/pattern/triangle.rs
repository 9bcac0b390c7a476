//! Triangles over `triangle_pivots` consecutive pivots.
//!
//! Pivot highs and lows are each fitted with a least-squares line. A line is
//! flat when its relative drift across the pattern is below
//! `flat_tolerance`, rising or falling when the drift exceeds it.
//!
//! - Ascending: flat highs, rising lows (bullish)
//! - Descending: flat lows, falling highs (bearish)
//! - Symmetrical: falling highs, rising lows; direction from the close at
//!   `end_index` against the midpoint of the last high and last low

use crate::domain::direction::Direction;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pattern::pivot::PivotKind;
use crate::domain::pattern::{
    PatternKind, PatternMatch, PatternParams, Pivot, build_match, fit_ratio,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    /// Relative change of the fitted line from the first to the last pivot.
    drift: f64,
    /// Root-mean-square residual relative to the mean price.
    scatter: f64,
}

fn fit_line(points: &[&Pivot], first: usize, last: usize) -> Option<Line> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.index as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.price).sum::<f64>() / n;
    if mean_y <= 0.0 {
        return None;
    }
    let sxx: f64 = points
        .iter()
        .map(|p| (p.index as f64 - mean_x).powi(2))
        .sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|p| (p.index as f64 - mean_x) * (p.price - mean_y))
        .sum();
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let rss: f64 = points
        .iter()
        .map(|p| (p.price - (intercept + slope * p.index as f64)).powi(2))
        .sum();

    Some(Line {
        drift: slope * (last - first) as f64 / mean_y,
        scatter: (rss / n).sqrt() / mean_y,
    })
}

struct Fit<'a> {
    anchors: &'a [Pivot],
    highs: Line,
    lows: Line,
}

fn fits<'a>(pivots: &'a [Pivot], params: &PatternParams) -> Vec<Fit<'a>> {
    if params.triangle_pivots < 4 {
        return Vec::new();
    }
    pivots
        .windows(params.triangle_pivots)
        .filter_map(|w| {
            let highs: Vec<&Pivot> = w.iter().filter(|p| p.kind == PivotKind::High).collect();
            let lows: Vec<&Pivot> = w.iter().filter(|p| p.kind == PivotKind::Low).collect();
            if highs.len() < 2 || lows.len() < 2 {
                return None;
            }
            let (first, last) = (w[0].index, w[w.len() - 1].index);
            let last_high = highs[highs.len() - 1].price;
            let last_low = lows[lows.len() - 1].price;
            if last_high <= last_low {
                return None;
            }
            Some(Fit {
                anchors: w,
                highs: fit_line(&highs, first, last)?,
                lows: fit_line(&lows, first, last)?,
            })
        })
        .collect()
}

fn scatter_error(fit: &Fit, params: &PatternParams) -> f64 {
    fit_ratio((fit.highs.scatter + fit.lows.scatter) / 2.0, params.flat_tolerance)
}

pub fn ascending_triangles(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    let tol = params.flat_tolerance;
    fits(pivots, params)
        .into_iter()
        .filter(|f| f.highs.drift.abs() < tol && f.lows.drift >= tol)
        .filter_map(|f| {
            let fit_error = fit_ratio(f.highs.drift.abs(), tol).max(scatter_error(&f, params));
            build_match(
                bars,
                PatternKind::AscendingTriangle,
                Direction::Bullish,
                f.anchors,
                fit_error,
                params,
            )
        })
        .collect()
}

pub fn descending_triangles(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    let tol = params.flat_tolerance;
    fits(pivots, params)
        .into_iter()
        .filter(|f| f.lows.drift.abs() < tol && f.highs.drift <= -tol)
        .filter_map(|f| {
            let fit_error = fit_ratio(f.lows.drift.abs(), tol).max(scatter_error(&f, params));
            build_match(
                bars,
                PatternKind::DescendingTriangle,
                Direction::Bearish,
                f.anchors,
                fit_error,
                params,
            )
        })
        .collect()
}

pub fn symmetrical_triangles(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    let tol = params.flat_tolerance;
    fits(pivots, params)
        .into_iter()
        .filter(|f| f.highs.drift <= -tol && f.lows.drift >= tol)
        .filter_map(|f| {
            let last_high = f.anchors.iter().rev().find(|p| p.kind == PivotKind::High)?;
            let last_low = f.anchors.iter().rev().find(|p| p.kind == PivotKind::Low)?;
            let midpoint = (last_high.price + last_low.price) / 2.0;

            let mut found = build_match(
                bars,
                PatternKind::SymmetricalTriangle,
                Direction::Neutral,
                f.anchors,
                scatter_error(&f, params),
                params,
            )?;
            found.direction = Direction::from_sign(bars[found.end_index].close - midpoint);
            Some(found)
        })
        .collect()
}
