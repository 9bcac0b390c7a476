//! Support and resistance levels from clustered pivot prices.
//!
//! Pivots are sorted by price and grouped greedily: a pivot joins the
//! current cluster while it is within `level_tolerance` of the cluster's
//! lowest price. Clusters with at least `min_touches` pivots become levels.
//!
//! Each touch weighs `0.5^(age / recency_half_life)` where age is measured
//! in bars back from the reference index; confidence is `w / (w + 1)` for
//! the summed weight `w`.

use serde::Serialize;

use crate::domain::pattern::{PatternParams, Pivot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportResistanceLevel {
    pub kind: LevelKind,
    pub price: f64,
    pub touches: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub confidence: f64,
}

impl SupportResistanceLevel {
    /// Relative distance between `price` and this level.
    pub fn distance(&self, price: f64) -> f64 {
        (price - self.price).abs() / self.price
    }
}

/// Levels at or below `reference_close` are support, the rest resistance.
/// Sorted by price.
pub fn find_levels(
    pivots: &[Pivot],
    reference_close: f64,
    reference_index: usize,
    params: &PatternParams,
) -> Vec<SupportResistanceLevel> {
    let mut sorted: Vec<&Pivot> = pivots.iter().filter(|p| p.price > 0.0).collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.index.cmp(&b.index)));

    let mut clusters: Vec<Vec<&Pivot>> = Vec::new();
    for pivot in sorted {
        let joins = clusters.last().is_some_and(|cluster| {
            (pivot.price - cluster[0].price) / cluster[0].price <= params.level_tolerance
        });
        match clusters.last_mut() {
            Some(cluster) if joins => cluster.push(pivot),
            _ => clusters.push(vec![pivot]),
        }
    }

    let min_touches = params.min_touches.max(1);
    clusters
        .into_iter()
        .filter(|c| c.len() >= min_touches)
        .map(|cluster| {
            let price = cluster.iter().map(|p| p.price).sum::<f64>() / cluster.len() as f64;
            let weight: f64 = cluster
                .iter()
                .map(|p| {
                    let age = reference_index.saturating_sub(p.index) as f64;
                    0.5_f64.powf(age / params.recency_half_life)
                })
                .sum();
            let kind = if price <= reference_close {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            };
            SupportResistanceLevel {
                kind,
                price,
                touches: cluster.len(),
                first_index: cluster.iter().map(|p| p.index).min().unwrap_or(0),
                last_index: cluster.iter().map(|p| p.index).max().unwrap_or(0),
                confidence: weight / (weight + 1.0),
            }
        })
        .collect()
}
