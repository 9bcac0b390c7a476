//! Validated, read-only price series.
//!
//! A [`Series`] is built once from bars supplied by a data port and never
//! mutated afterwards; every derived value refers back to it by index.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::{SamsignalError, Warning};
use super::ohlcv::OhlcvBar;

pub const DEFAULT_MAX_GAP_DAYS: i64 = 5;

/// A calendar gap between two consecutive bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    /// Index of the bar after the gap.
    pub index: usize,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone)]
pub struct Series {
    bars: Vec<OhlcvBar>,
    gaps: Vec<Gap>,
}

impl Series {
    /// Validate `bars` and build a series.
    ///
    /// Fails on an empty input, a non-increasing date or a malformed bar.
    /// Gaps wider than `max_gap_days` are recorded, not rejected.
    pub fn new(bars: Vec<OhlcvBar>, max_gap_days: i64) -> Result<Self, SamsignalError> {
        if bars.is_empty() {
            return Err(SamsignalError::EmptySeries);
        }

        let mut gaps = Vec::new();
        for (i, bar) in bars.iter().enumerate() {
            if let Some(reason) = bar.defect() {
                return Err(SamsignalError::InvalidBar {
                    index: i,
                    date: bar.date,
                    reason,
                });
            }
            if i == 0 {
                continue;
            }
            let previous = bars[i - 1].date;
            if bar.date <= previous {
                return Err(SamsignalError::NonMonotonicDate {
                    index: i,
                    date: bar.date,
                    previous,
                });
            }
            let days = (bar.date - previous).num_days();
            if days > max_gap_days {
                gaps.push(Gap {
                    index: i,
                    from: previous,
                    to: bar.date,
                    days,
                });
            }
        }

        Ok(Series { bars, gaps })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn gap_warnings(&self) -> Vec<Warning> {
        self.gaps
            .iter()
            .map(|g| Warning::SeriesGap {
                index: g.index,
                from: g.from,
                to: g.to,
                days: g.days,
            })
            .collect()
    }

    /// Fail unless the series holds at least `minimum` bars.
    pub fn require(&self, minimum: usize) -> Result<(), SamsignalError> {
        if self.bars.len() < minimum {
            return Err(SamsignalError::InsufficientData {
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}
