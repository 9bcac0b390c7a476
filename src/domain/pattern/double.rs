//! Double top (H L H) and double bottom (L H L).
//!
//! Two extremes within `peak_tolerance` of each other, separated by a
//! retracement of at least `min_depth`.

use crate::domain::direction::Direction;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pattern::pivot::{PivotKind, kinds_match};
use crate::domain::pattern::{
    PatternKind, PatternMatch, PatternParams, Pivot, build_match, fit_ratio,
};

pub fn double_tops(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    pivots
        .windows(3)
        .filter(|w| kinds_match(w, &[PivotKind::High, PivotKind::Low, PivotKind::High]))
        .filter_map(|w| {
            let (first, trough, second) = (w[0].price, w[1].price, w[2].price);
            let top = first.max(second);
            let lower = first.min(second);
            if lower <= 0.0 {
                return None;
            }
            let spread = (first - second).abs() / top;
            if spread > params.peak_tolerance || (lower - trough) / lower < params.min_depth {
                return None;
            }
            let fit_error = fit_ratio(spread, params.peak_tolerance);
            build_match(bars, PatternKind::DoubleTop, Direction::Bearish, w, fit_error, params)
        })
        .collect()
}

pub fn double_bottoms(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    pivots
        .windows(3)
        .filter(|w| kinds_match(w, &[PivotKind::Low, PivotKind::High, PivotKind::Low]))
        .filter_map(|w| {
            let (first, peak, second) = (w[0].price, w[1].price, w[2].price);
            let bottom = first.min(second);
            let higher = first.max(second);
            if bottom <= 0.0 {
                return None;
            }
            let spread = (first - second).abs() / bottom;
            if spread > params.peak_tolerance || (peak - higher) / higher < params.min_depth {
                return None;
            }
            let fit_error = fit_ratio(spread, params.peak_tolerance);
            build_match(bars, PatternKind::DoubleBottom, Direction::Bullish, w, fit_error, params)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::find_pivots;
    use crate::domain::pattern::tests::double_top_closes;
    use crate::domain::testing::make_bars;

    fn params() -> PatternParams {
        PatternParams {
            pivot_radius: 2,
            ..PatternParams::default()
        }
    }

    #[test]
    fn detects_equal_peaks() {
        let bars = make_bars(&double_top_closes());
        let pivots = find_pivots(&bars, 2);
        let found = double_tops(&bars, &pivots, &params());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key_points.len(), 3);
        assert_eq!(found[0].key_points[1].index, 10);
    }

    #[test]
    fn rejects_peaks_too_far_apart_in_price() {
        let mut closes = double_top_closes();
        // second peak 5% above the first
        closes[15] = 115.5;
        let bars = make_bars(&closes);
        let pivots = find_pivots(&bars, 2);
        assert!(double_tops(&bars, &pivots, &params()).is_empty());
    }

    #[test]
    fn rejects_shallow_trough() {
        let closes = vec![
            100.0, 101.0, 102.0, 103.0, 104.0, 110.0, 109.5, 109.0, 108.8, 108.6, 108.5, 108.6,
            108.8, 109.0, 109.5, 110.0, 105.0, 104.0, 103.0, 102.0,
        ];
        let bars = make_bars(&closes);
        let pivots = find_pivots(&bars, 2);
        assert!(double_tops(&bars, &pivots, &params()).is_empty());
    }

    #[test]
    fn rejects_anchors_outside_window() {
        let bars = make_bars(&double_top_closes());
        let pivots = find_pivots(&bars, 2);
        let narrow = PatternParams {
            window: 5,
            ..params()
        };
        assert!(double_tops(&bars, &pivots, &narrow).is_empty());
    }

    #[test]
    fn detects_double_bottom_mirror() {
        let closes: Vec<f64> = double_top_closes().iter().map(|c| 210.0 - c).collect();
        let bars = make_bars(&closes);
        let pivots = find_pivots(&bars, 2);
        let found = double_bottoms(&bars, &pivots, &params());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].direction, Direction::Bullish);
        assert!(double_tops(&bars, &pivots, &params()).is_empty());
    }

    #[test]
    fn non_positive_peaks_are_skipped() {
        let closes = [-20.0, -10.0, 0.0, -10.0, -20.0, -10.0, 0.0, -10.0, -20.0];
        let bars = make_bars(&closes);
        let pivots = find_pivots(&bars, 2);
        assert!(double_tops(&bars, &pivots, &params()).is_empty());
    }
}
