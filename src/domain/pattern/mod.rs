//! Chart pattern detection over pivot sequences.
//!
//! The detector reduces the price path to pivots ([`pivot`]), runs every
//! registered recognizer over them, resolves same-kind overlaps and derives
//! support/resistance levels ([`levels`]).
//!
//! Recognizers emit *candidates*; [`resolve_overlaps`] picks the winners.
//! The scorer keeps the candidates so it can re-resolve them causally.

pub mod double;
pub mod head_shoulders;
pub mod levels;
pub mod pivot;
pub mod triangle;

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::domain::cancel::CancelToken;
use crate::domain::direction::Direction;
use crate::domain::error::Warning;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::Series;

pub use levels::{LevelKind, SupportResistanceLevel, find_levels};
pub use pivot::{Pivot, PivotKind, find_pivots};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cap = PATTERNS.iter().find(|c| c.kind == *self);
        match cap {
            Some(cap) => write!(f, "{}", cap.name),
            None => write!(f, "{:?}", self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyPoint {
    pub index: usize,
    pub price: f64,
}

impl From<&Pivot> for KeyPoint {
    fn from(p: &Pivot) -> Self {
        KeyPoint {
            index: p.index,
            price: p.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub direction: Direction,
    pub start_index: usize,
    /// Last bar whose data the detection used, including pivot confirmation.
    pub end_index: usize,
    pub confidence: f64,
    pub key_points: Vec<KeyPoint>,
}

impl PatternMatch {
    pub fn overlaps(&self, other: &PatternMatch) -> bool {
        self.start_index <= other.end_index && other.start_index <= self.end_index
    }
}

/// Detector tolerances. Ratios are relative to price.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternParams {
    pub pivot_radius: usize,
    /// Maximum bar distance between the first and last anchor of a match.
    pub window: usize,
    pub peak_tolerance: f64,
    pub min_depth: f64,
    pub flat_tolerance: f64,
    pub triangle_pivots: usize,
    pub fit_weight: f64,
    pub volume_weight: f64,
    pub level_tolerance: f64,
    pub min_touches: usize,
    pub recency_half_life: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        PatternParams {
            pivot_radius: 3,
            window: 60,
            peak_tolerance: 0.02,
            min_depth: 0.02,
            flat_tolerance: 0.01,
            triangle_pivots: 4,
            fit_weight: 0.7,
            volume_weight: 0.3,
            level_tolerance: 0.01,
            min_touches: 2,
            recency_half_life: 50.0,
        }
    }
}

type Recognizer = fn(&[OhlcvBar], &[Pivot], &PatternParams) -> Vec<PatternMatch>;

pub struct PatternCapability {
    pub kind: PatternKind,
    pub name: &'static str,
    recognize: Recognizer,
}

pub const PATTERNS: &[PatternCapability] = &[
    PatternCapability {
        kind: PatternKind::DoubleTop,
        name: "double_top",
        recognize: double::double_tops,
    },
    PatternCapability {
        kind: PatternKind::DoubleBottom,
        name: "double_bottom",
        recognize: double::double_bottoms,
    },
    PatternCapability {
        kind: PatternKind::HeadAndShoulders,
        name: "head_and_shoulders",
        recognize: head_shoulders::head_and_shoulders,
    },
    PatternCapability {
        kind: PatternKind::InverseHeadAndShoulders,
        name: "inverse_head_and_shoulders",
        recognize: head_shoulders::inverse_head_and_shoulders,
    },
    PatternCapability {
        kind: PatternKind::AscendingTriangle,
        name: "ascending_triangle",
        recognize: triangle::ascending_triangles,
    },
    PatternCapability {
        kind: PatternKind::DescendingTriangle,
        name: "descending_triangle",
        recognize: triangle::descending_triangles,
    },
    PatternCapability {
        kind: PatternKind::SymmetricalTriangle,
        name: "symmetrical_triangle",
        recognize: triangle::symmetrical_triangles,
    },
];

/// Deviation as a fraction of its tolerance. A zero tolerance admits only
/// exact fits, which score 0.
pub(crate) fn fit_ratio(deviation: f64, tolerance: f64) -> f64 {
    if tolerance > 0.0 {
        deviation / tolerance
    } else if deviation > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Combine template fit and volume confirmation into a confidence in [0, 1].
/// A non-finite fit error counts as the worst fit.
pub(crate) fn confidence(fit_error: f64, volume_score: f64, params: &PatternParams) -> f64 {
    let fit_error = if fit_error.is_finite() { fit_error } else { 1.0 };
    let fit = 1.0 - fit_error.clamp(0.0, 1.0);
    (params.fit_weight * fit + params.volume_weight * volume_score.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

/// Volume of the confirmation segment (after the last anchor) against the
/// average volume of the whole span. Equal volume scores 0.5, double scores 1.
pub(crate) fn volume_score(bars: &[OhlcvBar], start: usize, last_anchor: usize, end: usize) -> f64 {
    let mean = |slice: &[OhlcvBar]| {
        if slice.is_empty() {
            0.0
        } else {
            slice.iter().map(|b| b.volume as f64).sum::<f64>() / slice.len() as f64
        }
    };
    let span = mean(&bars[start..=end]);
    if span <= 0.0 {
        return 0.5;
    }
    let confirm = if last_anchor < end {
        mean(&bars[last_anchor + 1..=end])
    } else {
        mean(&bars[last_anchor..=end])
    };
    (confirm / span / 2.0).clamp(0.0, 1.0)
}

/// Build a match from its anchors; `end_index` extends past the last anchor
/// by the pivot radius.
pub(crate) fn build_match(
    bars: &[OhlcvBar],
    kind: PatternKind,
    direction: Direction,
    anchors: &[Pivot],
    fit_error: f64,
    params: &PatternParams,
) -> Option<PatternMatch> {
    let first = anchors.first()?;
    let last = anchors.last()?;
    if last.index - first.index > params.window {
        return None;
    }
    let end_index = last.confirmed_at(params.pivot_radius).min(bars.len() - 1);
    let volume = volume_score(bars, first.index, last.index, end_index);
    Some(PatternMatch {
        kind,
        direction,
        start_index: first.index,
        end_index,
        confidence: confidence(fit_error, volume, params),
        key_points: anchors.iter().map(KeyPoint::from).collect(),
    })
}

/// Run every recognizer over `pivots` and return all candidates.
pub fn detect_candidates(
    bars: &[OhlcvBar],
    pivots: &[Pivot],
    params: &PatternParams,
    cancel: &CancelToken,
) -> (Vec<PatternMatch>, bool) {
    let per_kind: Vec<Option<Vec<PatternMatch>>> = PATTERNS
        .par_iter()
        .map(|cap| {
            if cancel.is_cancelled() {
                return None;
            }
            let found = (cap.recognize)(bars, pivots, params);
            tracing::trace!(pattern = cap.name, candidates = found.len(), "recognizer done");
            Some(found)
        })
        .collect();

    let complete = per_kind.iter().all(Option::is_some);
    let candidates = per_kind.into_iter().flatten().flatten().collect();
    (candidates, complete)
}

/// Keep the best match of each overlapping same-kind group.
///
/// Highest confidence wins; equal confidence goes to the most recent
/// `end_index`. Output is ordered by start index, then kind.
pub fn resolve_overlaps(candidates: &[PatternMatch]) -> Vec<PatternMatch> {
    let mut ranked: Vec<&PatternMatch> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(b.confidence.total_cmp(&a.confidence))
            .then(b.end_index.cmp(&a.end_index))
            .then(a.start_index.cmp(&b.start_index))
    });

    let mut kept: Vec<PatternMatch> = Vec::new();
    for candidate in ranked {
        let clash = kept
            .iter()
            .any(|k| k.kind == candidate.kind && k.overlaps(candidate));
        if !clash {
            kept.push(candidate.clone());
        }
    }

    kept.sort_by(|a, b| {
        a.start_index
            .cmp(&b.start_index)
            .then(a.kind.cmp(&b.kind))
            .then(a.end_index.cmp(&b.end_index))
    });
    kept
}

/// Everything the detector found in one series.
#[derive(Debug, Clone, Serialize)]
pub struct PatternScan {
    pub pivots: Vec<Pivot>,
    #[serde(skip)]
    pub candidates: Vec<PatternMatch>,
    pub matches: Vec<PatternMatch>,
    pub levels: Vec<SupportResistanceLevel>,
    pub complete: bool,
}

impl PatternScan {
    pub fn warnings(&self) -> Vec<Warning> {
        if self.complete {
            Vec::new()
        } else {
            vec![Warning::Incomplete {
                stage: "pattern scan".to_string(),
            }]
        }
    }
}

pub fn scan_patterns(series: &Series, params: &PatternParams, cancel: &CancelToken) -> PatternScan {
    let bars = series.bars();
    let pivots = find_pivots(bars, params.pivot_radius);
    let (candidates, complete) = detect_candidates(bars, &pivots, params, cancel);
    let matches = resolve_overlaps(&candidates);

    let last = bars.len() - 1;
    let levels = find_levels(&pivots, bars[last].close, last, params);

    if !complete {
        tracing::warn!("pattern scan cancelled; returning partial result");
    }
    tracing::debug!(
        pivots = pivots.len(),
        candidates = candidates.len(),
        matches = matches.len(),
        levels = levels.len(),
        "pattern scan finished"
    );

    PatternScan {
        pivots,
        candidates,
        matches,
        levels,
        complete,
    }
}
