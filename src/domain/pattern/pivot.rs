//! Pivot extraction.
//!
//! Bar i is a pivot high when its high is strictly above every high in the
//! `radius` bars before it and at least every high in the `radius` bars
//! after it. Pivot lows mirror this on lows. The asymmetric comparison makes
//! a flat top produce a single pivot at its first bar.

use serde::Serialize;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
    pub kind: PivotKind,
}

impl Pivot {
    /// First bar at which this pivot is known.
    pub fn confirmed_at(&self, radius: usize) -> usize {
        self.index + radius
    }
}

/// All pivots in index order; a bar that is both a high and a low yields the high first.
pub fn find_pivots(bars: &[OhlcvBar], radius: usize) -> Vec<Pivot> {
    let mut pivots = Vec::new();
    if radius == 0 || bars.len() < 2 * radius + 1 {
        return pivots;
    }

    for i in radius..bars.len() - radius {
        let high = bars[i].high;
        if bars[i - radius..i].iter().all(|b| high > b.high)
            && bars[i + 1..=i + radius].iter().all(|b| high >= b.high)
        {
            pivots.push(Pivot {
                index: i,
                price: high,
                kind: PivotKind::High,
            });
        }

        let low = bars[i].low;
        if bars[i - radius..i].iter().all(|b| low < b.low)
            && bars[i + 1..=i + radius].iter().all(|b| low <= b.low)
        {
            pivots.push(Pivot {
                index: i,
                price: low,
                kind: PivotKind::Low,
            });
        }
    }

    pivots
}

/// True when `pivots` has exactly the kinds in `pattern`, in order.
pub(crate) fn kinds_match(pivots: &[Pivot], pattern: &[PivotKind]) -> bool {
    pivots.len() == pattern.len() && pivots.iter().zip(pattern).all(|(p, k)| p.kind == *k)
}
