//! Head and shoulders (H L H L H) and its inverse (L H L H L).
//!
//! The head must clear both shoulders by `min_depth`; the shoulders must sit
//! within `peak_tolerance` of each other, measured against the head; both
//! neckline pivots must lie beyond the shoulders.

use crate::domain::direction::Direction;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pattern::pivot::{PivotKind, kinds_match};
use crate::domain::pattern::{
    PatternKind, PatternMatch, PatternParams, Pivot, build_match, fit_ratio,
};

const TOP: [PivotKind; 5] = [
    PivotKind::High,
    PivotKind::Low,
    PivotKind::High,
    PivotKind::Low,
    PivotKind::High,
];

const BOTTOM: [PivotKind; 5] = [
    PivotKind::Low,
    PivotKind::High,
    PivotKind::Low,
    PivotKind::High,
    PivotKind::Low,
];

pub fn head_and_shoulders(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    pivots
        .windows(5)
        .filter(|w| kinds_match(w, &TOP))
        .filter_map(|w| {
            let (left, neck_a, head, neck_b, right) =
                (w[0].price, w[1].price, w[2].price, w[3].price, w[4].price);
            let shoulder = left.max(right);
            if head < shoulder * (1.0 + params.min_depth) {
                return None;
            }
            let spread = (left - right).abs() / head;
            if spread > params.peak_tolerance {
                return None;
            }
            if neck_a.max(neck_b) >= left.min(right) {
                return None;
            }
            build_match(
                bars,
                PatternKind::HeadAndShoulders,
                Direction::Bearish,
                w,
                fit_ratio(spread, params.peak_tolerance),
                params,
            )
        })
        .collect()
}

pub fn inverse_head_and_shoulders(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
) -> Vec<PatternMatch> {
    pivots
        .windows(5)
        .filter(|w| kinds_match(w, &BOTTOM))
        .filter_map(|w| {
            let (left, neck_a, head, neck_b, right) =
                (w[0].price, w[1].price, w[2].price, w[3].price, w[4].price);
            let shoulder = left.min(right);
            if head > shoulder * (1.0 - params.min_depth) {
                return None;
            }
            let reference = left.max(right);
            if reference <= 0.0 {
                return None;
            }
            let spread = (left - right).abs() / reference;
            if spread > params.peak_tolerance {
                return None;
            }
            if neck_a.min(neck_b) <= left.max(right) {
                return None;
            }
            build_match(
                bars,
                PatternKind::InverseHeadAndShoulders,
                Direction::Bullish,
                w,
                fit_ratio(spread, params.peak_tolerance),
                params,
            )
        })
        .collect()
}
