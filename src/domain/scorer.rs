//! Composite signal scoring.
//!
//! Each bar gets one reading per component in [-1, 1]. Components whose
//! inputs are absent at that bar are skipped, so they neither vote nor
//! dilute the score:
//!
//! score = Σ wᵢ·cᵢ / Σ |wᵢ|   over present components
//!
//! Pattern and support/resistance readings only use pivots and matches
//! confirmed by the bar being scored.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::direction::Direction;
use crate::domain::indicator::macd;
use crate::domain::indicator::registry::IndicatorSet;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pattern::{
    LevelKind, PatternKind, PatternParams, PatternScan, find_levels, resolve_overlaps,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Trend,
    Momentum,
    Oscillator,
    Volatility,
    Pattern,
    SupportResistance,
    Volume,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Trend,
        Component::Momentum,
        Component::Oscillator,
        Component::Volatility,
        Component::Pattern,
        Component::SupportResistance,
        Component::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Trend => "trend",
            Component::Momentum => "momentum",
            Component::Oscillator => "oscillator",
            Component::Volatility => "volatility",
            Component::Pattern => "pattern",
            Component::SupportResistance => "support_resistance",
            Component::Volume => "volume",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown component '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub trend: f64,
    pub momentum: f64,
    pub oscillator: f64,
    pub volatility: f64,
    pub pattern: f64,
    pub support_resistance: f64,
    pub volume: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            trend: 2.0,
            momentum: 1.5,
            oscillator: 1.0,
            volatility: 1.0,
            pattern: 2.0,
            support_resistance: 1.5,
            volume: 1.0,
        }
    }
}

impl Weights {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Trend => self.trend,
            Component::Momentum => self.momentum,
            Component::Oscillator => self.oscillator,
            Component::Volatility => self.volatility,
            Component::Pattern => self.pattern,
            Component::SupportResistance => self.support_resistance,
            Component::Volume => self.volume,
        }
    }

    pub fn set(&mut self, component: Component, weight: f64) {
        let slot = match component {
            Component::Trend => &mut self.trend,
            Component::Momentum => &mut self.momentum,
            Component::Oscillator => &mut self.oscillator,
            Component::Volatility => &mut self.volatility,
            Component::Pattern => &mut self.pattern,
            Component::SupportResistance => &mut self.support_resistance,
            Component::Volume => &mut self.volume,
        };
        *slot = weight;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    pub fn indicator(self, period: usize) -> IndicatorType {
        match self {
            MaKind::Sma => IndicatorType::Sma(period),
            MaKind::Ema => IndicatorType::Ema(period),
        }
    }
}

impl FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sma" => Ok(MaKind::Sma),
            "ema" => Ok(MaKind::Ema),
            other => Err(format!("expected sma or ema, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerParams {
    pub ma_kind: MaKind,
    pub trend_fast: usize,
    pub trend_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,
    pub volume_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub neutral_threshold: f64,
    /// Bars after `end_index` during which a pattern still votes.
    pub pattern_active_bars: usize,
    pub weights: Weights,
}

impl Default for ScorerParams {
    fn default() -> Self {
        ScorerParams {
            ma_kind: MaKind::Sma,
            trend_fast: 5,
            trend_slow: 20,
            rsi_period: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: 20,
            bollinger_mult_x100: 200,
            volume_period: 20,
            oversold: 30.0,
            overbought: 70.0,
            neutral_threshold: 0.1,
            pattern_active_bars: 5,
            weights: Weights::default(),
        }
    }
}

impl ScorerParams {
    pub fn fast_ma(&self) -> IndicatorType {
        self.ma_kind.indicator(self.trend_fast)
    }

    pub fn slow_ma(&self) -> IndicatorType {
        self.ma_kind.indicator(self.trend_slow)
    }

    pub fn rsi(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    pub fn macd(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn bollinger(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bollinger_period,
            stddev_mult_x100: self.bollinger_mult_x100,
        }
    }

    pub fn volume_sma(&self) -> IndicatorType {
        IndicatorType::VolumeSma(self.volume_period)
    }

    /// Indicators the scorer reads.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![
            self.fast_ma(),
            self.slow_ma(),
            self.rsi(),
            self.macd(),
            self.bollinger(),
            self.volume_sma(),
        ]
    }

    /// First bar that gets a signal.
    pub fn warmup(&self) -> usize {
        self.trend_slow.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSignal {
    pub index: usize,
    pub date: NaiveDate,
    pub direction: Direction,
    pub score: f64,
    pub strength: f64,
    /// Weighted contribution (weight × reading) of each present component.
    pub contributions: BTreeMap<Component, f64>,
}

/// What a component saw at one bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    Trend { fast: f64, slow: f64 },
    Momentum { line: f64, signal: f64 },
    Oscillator { rsi: f64, oversold: f64, overbought: f64 },
    Volatility { close: f64, upper: f64, lower: f64 },
    Pattern { active: Vec<(PatternKind, Direction, f64)> },
    Level { kind: LevelKind, price: f64, confidence: f64 },
    Volume { ratio: f64, change: f64 },
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::Trend { fast, slow } => {
                let relation = if fast > slow {
                    "above"
                } else if fast < slow {
                    "below"
                } else {
                    "level with"
                };
                write!(f, "fast MA {:.2} {} slow MA {:.2}", fast, relation, slow)
            }
            Evidence::Momentum { line, signal } => {
                let relation = if line > signal {
                    "above"
                } else if line < signal {
                    "below"
                } else {
                    "on"
                };
                write!(f, "MACD {:.4} {} signal line {:.4}", line, relation, signal)
            }
            Evidence::Oscillator {
                rsi,
                oversold,
                overbought,
            } => {
                if rsi < oversold {
                    write!(f, "oversold (RSI {:.1} < {})", rsi, oversold)
                } else if rsi > overbought {
                    write!(f, "overbought (RSI {:.1} > {})", rsi, overbought)
                } else {
                    write!(f, "neutral (RSI {:.1})", rsi)
                }
            }
            Evidence::Volatility {
                close,
                upper,
                lower,
            } => {
                if close < lower {
                    write!(f, "close {:.2} below lower band {:.2}", close, lower)
                } else if close > upper {
                    write!(f, "close {:.2} above upper band {:.2}", close, upper)
                } else {
                    write!(f, "close {:.2} inside bands [{:.2}, {:.2}]", close, lower, upper)
                }
            }
            Evidence::Pattern { active } => {
                let names: Vec<String> = active
                    .iter()
                    .map(|(kind, direction, confidence)| {
                        format!("{} ({}, {:.2})", kind, direction, confidence)
                    })
                    .collect();
                write!(f, "active: {}", names.join(", "))
            }
            Evidence::Level {
                kind,
                price,
                confidence,
            } => {
                let name = match kind {
                    LevelKind::Support => "support",
                    LevelKind::Resistance => "resistance",
                };
                write!(f, "near {} at {:.2} (confidence {:.2})", name, price, confidence)
            }
            Evidence::Volume { ratio, change } => {
                if *ratio > 1.0 {
                    let way = match Direction::from_sign(*change) {
                        Direction::Bullish => "up",
                        Direction::Bearish => "down",
                        Direction::Neutral => "flat",
                    };
                    write!(f, "volume {:.2}x average on {} move", ratio, way)
                } else {
                    write!(f, "volume {:.2}x average, no confirmation", ratio)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentExplanation {
    pub component: Component,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub signal: CompositeSignal,
    pub components: Vec<ComponentExplanation>,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.signal;
        writeln!(
            f,
            "{} (bar {}): {}, score {:+.3}, strength {:.3}",
            s.date, s.index, s.direction, s.score, s.strength
        )?;
        if self.components.is_empty() {
            return writeln!(f, "  no component had data");
        }
        for c in &self.components {
            writeln!(
                f,
                "  {:<20} {:+.2} x {:.2} = {:+.2}  {}",
                c.component.name(),
                c.value,
                c.weight,
                c.contribution,
                c.evidence
            )?;
        }
        Ok(())
    }
}

/// +1 when `a` is above `b`, -1 below, 0 when they differ by rounding noise
/// relative to `scale`.
fn vote(a: f64, b: f64, scale: f64) -> f64 {
    let diff = a - b;
    if diff.abs() <= 1e-9 * scale.abs().max(1.0) {
        0.0
    } else {
        diff.signum()
    }
}

/// Scores bars from precomputed indicators and a pattern scan.
pub struct Scorer<'a> {
    bars: &'a [OhlcvBar],
    scan: &'a PatternScan,
    params: &'a ScorerParams,
    pattern_params: &'a PatternParams,
    fast: Option<&'a IndicatorSeries>,
    slow: Option<&'a IndicatorSeries>,
    rsi: Option<&'a IndicatorSeries>,
    macd: Option<&'a IndicatorSeries>,
    bands: Option<&'a IndicatorSeries>,
    volume: Option<&'a IndicatorSeries>,
}

impl<'a> Scorer<'a> {
    pub fn new(
        bars: &'a [OhlcvBar],
        indicators: &'a IndicatorSet,
        scan: &'a PatternScan,
        params: &'a ScorerParams,
        pattern_params: &'a PatternParams,
    ) -> Self {
        Scorer {
            bars,
            scan,
            params,
            pattern_params,
            fast: indicators.get(&params.fast_ma()),
            slow: indicators.get(&params.slow_ma()),
            rsi: indicators.get(&params.rsi()),
            macd: indicators.get(&params.macd()),
            bands: indicators.get(&params.bollinger()),
            volume: indicators.get(&params.volume_sma()),
        }
    }

    /// One signal per bar from the warmup onward.
    pub fn score_all(&self) -> Vec<CompositeSignal> {
        (self.params.warmup()..self.bars.len())
            .into_par_iter()
            .filter_map(|i| self.score_at(i))
            .collect()
    }

    pub fn score_at(&self, index: usize) -> Option<CompositeSignal> {
        if index < self.params.warmup() || index >= self.bars.len() {
            return None;
        }

        let mut contributions = BTreeMap::new();
        let mut total = 0.0;
        let mut norm = 0.0;
        for component in Component::ALL {
            if let Some(reading) = self.reading(component, index) {
                let weight = self.params.weights.get(component);
                let weighted = weight * reading.value;
                contributions.insert(component, weighted);
                total += weighted;
                norm += weight.abs();
            }
        }

        let score = if norm > 0.0 {
            (total / norm).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let strength = score.abs();
        let direction = if strength < self.params.neutral_threshold {
            Direction::Neutral
        } else {
            Direction::from_sign(score)
        };

        Some(CompositeSignal {
            index,
            date: self.bars[index].date,
            direction,
            score,
            strength,
            contributions,
        })
    }

    /// Per-component reasoning behind the signal at `index`.
    pub fn explain(&self, index: usize) -> Option<Explanation> {
        let signal = self.score_at(index)?;
        let components = Component::ALL
            .into_iter()
            .filter_map(|component| {
                let reading = self.reading(component, index)?;
                let weight = self.params.weights.get(component);
                Some(ComponentExplanation {
                    component,
                    value: reading.value,
                    weight,
                    contribution: weight * reading.value,
                    evidence: reading.evidence,
                })
            })
            .collect();
        Some(Explanation { signal, components })
    }

    pub fn reading(&self, component: Component, i: usize) -> Option<Reading> {
        match component {
            Component::Trend => self.trend(i),
            Component::Momentum => self.momentum(i),
            Component::Oscillator => self.oscillator(i),
            Component::Volatility => self.volatility(i),
            Component::Pattern => self.pattern(i),
            Component::SupportResistance => self.support_resistance(i),
            Component::Volume => self.volume(i),
        }
    }

    fn trend(&self, i: usize) -> Option<Reading> {
        let fast = self.fast?.simple(i)?;
        let slow = self.slow?.simple(i)?;
        Some(Reading {
            value: vote(fast, slow, self.bars[i].close),
            evidence: Evidence::Trend { fast, slow },
        })
    }

    fn momentum(&self, i: usize) -> Option<Reading> {
        match self.macd?.get(i)? {
            IndicatorValue::Macd { line, signal, .. } => Some(Reading {
                value: vote(*line, *signal, self.bars[i].close),
                evidence: Evidence::Momentum {
                    line: *line,
                    signal: *signal,
                },
            }),
            _ => None,
        }
    }

    fn oscillator(&self, i: usize) -> Option<Reading> {
        let rsi = self.rsi?.simple(i)?;
        let value = if rsi < self.params.oversold {
            1.0
        } else if rsi > self.params.overbought {
            -1.0
        } else {
            0.0
        };
        Some(Reading {
            value,
            evidence: Evidence::Oscillator {
                rsi,
                oversold: self.params.oversold,
                overbought: self.params.overbought,
            },
        })
    }

    fn volatility(&self, i: usize) -> Option<Reading> {
        match self.bands?.get(i)? {
            IndicatorValue::Bands { upper, lower, .. } => {
                let close = self.bars[i].close;
                let value = if close < *lower {
                    1.0
                } else if close > *upper {
                    -1.0
                } else {
                    0.0
                };
                Some(Reading {
                    value,
                    evidence: Evidence::Volatility {
                        close,
                        upper: *upper,
                        lower: *lower,
                    },
                })
            }
            _ => None,
        }
    }

    fn pattern(&self, i: usize) -> Option<Reading> {
        let known: Vec<_> = self
            .scan
            .candidates
            .iter()
            .filter(|m| m.end_index <= i)
            .cloned()
            .collect();
        if known.is_empty() {
            return None;
        }

        let active: Vec<_> = resolve_overlaps(&known)
            .into_iter()
            .filter(|m| i <= m.end_index + self.params.pattern_active_bars)
            .collect();
        if active.is_empty() {
            return None;
        }

        let votes: f64 = active.iter().map(|m| m.direction.sign()).sum();
        let strongest = active.iter().map(|m| m.confidence).fold(0.0, f64::max);
        Some(Reading {
            value: votes.clamp(-1.0, 1.0) * strongest,
            evidence: Evidence::Pattern {
                active: active
                    .iter()
                    .map(|m| (m.kind, m.direction, m.confidence))
                    .collect(),
            },
        })
    }

    fn support_resistance(&self, i: usize) -> Option<Reading> {
        let radius = self.pattern_params.pivot_radius;
        let confirmed: Vec<_> = self
            .scan
            .pivots
            .iter()
            .take_while(|p| p.confirmed_at(radius) <= i)
            .copied()
            .collect();
        if confirmed.is_empty() {
            return None;
        }

        let close = self.bars[i].close;
        let levels = find_levels(&confirmed, close, i, self.pattern_params);
        let nearest = levels
            .iter()
            .filter(|l| l.distance(close) <= self.pattern_params.level_tolerance)
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then(b.distance(close).total_cmp(&a.distance(close)))
            })?;

        let value = match nearest.kind {
            LevelKind::Support => nearest.confidence,
            LevelKind::Resistance => -nearest.confidence,
        };
        Some(Reading {
            value,
            evidence: Evidence::Level {
                kind: nearest.kind,
                price: nearest.price,
                confidence: nearest.confidence,
            },
        })
    }

    fn volume(&self, i: usize) -> Option<Reading> {
        let average = self.volume?.simple(i)?;
        if average <= 0.0 || i == 0 {
            return None;
        }
        let ratio = self.bars[i].volume as f64 / average;
        let change = self.bars[i].close - self.bars[i - 1].close;
        let value = if ratio > 1.0 {
            Direction::from_sign(change).sign() * (ratio - 1.0).min(1.0)
        } else {
            0.0
        };
        Some(Reading {
            value,
            evidence: Evidence::Volume { ratio, change },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancel::CancelToken;
    use crate::domain::indicator::registry::compute_indicators;
    use crate::domain::pattern::{PatternMatch, Pivot, PivotKind, scan_patterns};
    use crate::domain::series::{DEFAULT_MAX_GAP_DAYS, Series};
    use crate::domain::testing::{make_bars, with_volumes};

    fn run(closes: &[f64], volumes: Option<&[i64]>) -> (Vec<CompositeSignal>, Vec<Explanation>) {
        let mut bars = make_bars(closes);
        if let Some(v) = volumes {
            bars = with_volumes(bars, v);
        }
        let series = Series::new(bars, DEFAULT_MAX_GAP_DAYS).unwrap();
        let params = ScorerParams::default();
        let pattern_params = PatternParams::default();
        let indicators = compute_indicators(&series, &params.required_indicators()).unwrap();
        let scan = scan_patterns(&series, &pattern_params, &CancelToken::new());
        let scorer = Scorer::new(series.bars(), &indicators, &scan, &params, &pattern_params);
        let signals = scorer.score_all();
        let explanations = signals
            .iter()
            .filter_map(|s| scorer.explain(s.index))
            .collect();
        (signals, explanations)
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn rising_series_is_bullish_from_warmup() {
        let (signals, _) = run(&rising(50), None);
        assert_eq!(signals.len(), 31);
        assert_eq!(signals[0].index, 19);
        for s in &signals {
            assert_eq!(s.direction, Direction::Bullish, "bar {}", s.index);
        }
    }

    #[test]
    fn rising_series_score_before_macd() {
        let (signals, _) = run(&rising(50), None);
        // trend +2, oscillator -1 (RSI 100), volatility 0, volume 0 over weights 5
        let first = &signals[0];
        assert!((first.score - 0.2).abs() < 1e-12);
        assert_eq!(first.contributions.len(), 4);
        assert!(!first.contributions.contains_key(&Component::Momentum));

        // MACD line settles on its signal line for a linear ramp
        let last = signals.last().unwrap();
        assert!(last.contributions[&Component::Momentum].abs() < f64::EPSILON);
        assert!((last.score - 1.0 / 6.5).abs() < 1e-12);
    }

    #[test]
    fn flat_series_is_neutral() {
        let (signals, _) = run(&[100.0; 30], None);
        assert_eq!(signals.len(), 11);
        for s in &signals {
            assert_eq!(s.direction, Direction::Neutral);
            assert!(s.score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.4).sin() * 8.0 + i as f64 * 0.1)
            .collect();
        let (a, _) = run(&closes, None);
        let (b, _) = run(&closes, None);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn volume_spike_confirms_move() {
        let closes = rising(30);
        let mut volumes = vec![1000_i64; 30];
        volumes[25] = 1500;
        let (signals, _) = run(&closes, Some(&volumes));
        let s = signals.iter().find(|s| s.index == 25).unwrap();
        let volume = s.contributions[&Component::Volume];
        assert!(volume > 0.0 && volume <= 1.0);
    }

    #[test]
    fn explanation_lists_present_components() {
        let (_, explanations) = run(&rising(50), None);
        let text = explanations[0].to_string();
        assert!(text.contains("bullish"));
        assert!(text.contains("trend"));
        assert!(text.contains("overbought"));
        assert!(!text.contains("momentum"));
    }

    // ── Component readings over hand-built inputs ──

    fn scan_of(pivots: Vec<Pivot>, candidates: Vec<PatternMatch>) -> PatternScan {
        PatternScan {
            pivots,
            candidates,
            matches: vec![],
            levels: vec![],
            complete: true,
        }
    }

    fn candidate(
        kind: PatternKind,
        direction: Direction,
        span: (usize, usize),
        conf: f64,
    ) -> PatternMatch {
        PatternMatch {
            kind,
            direction,
            start_index: span.0,
            end_index: span.1,
            confidence: conf,
            key_points: vec![],
        }
    }

    fn indicators_of(series: Vec<(IndicatorType, Vec<Option<IndicatorValue>>)>) -> IndicatorSet {
        IndicatorSet {
            series: series
                .into_iter()
                .map(|(indicator_type, values)| IndicatorSeries {
                    indicator_type,
                    values,
                })
                .collect(),
            warnings: vec![],
        }
    }

    fn value_at(scorer: &Scorer, component: Component, i: usize) -> Option<f64> {
        scorer.reading(component, i).map(|r| r.value)
    }

    #[test]
    fn pattern_votes_only_inside_activity_window() {
        let bars = make_bars(&[100.0; 30]);
        let scan = scan_of(
            vec![],
            vec![candidate(PatternKind::DoubleBottom, Direction::Bullish, (5, 12), 0.8)],
        );
        let indicators = IndicatorSet::default();
        let params = ScorerParams::default();
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        assert_eq!(value_at(&scorer, Component::Pattern, 11), None);
        assert_eq!(value_at(&scorer, Component::Pattern, 12), Some(0.8));
        assert_eq!(value_at(&scorer, Component::Pattern, 17), Some(0.8));
        assert_eq!(value_at(&scorer, Component::Pattern, 18), None);
    }

    #[test]
    fn pattern_overlaps_resolve_with_candidates_known_so_far() {
        let bars = make_bars(&[100.0; 40]);
        let scan = scan_of(
            vec![],
            vec![
                candidate(PatternKind::DoubleTop, Direction::Bearish, (5, 12), 0.6),
                candidate(PatternKind::DoubleTop, Direction::Bearish, (10, 20), 0.9),
            ],
        );
        let indicators = IndicatorSet::default();
        let params = ScorerParams {
            pattern_active_bars: 10,
            ..ScorerParams::default()
        };
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        // only the first candidate has completed by bar 15
        assert_eq!(value_at(&scorer, Component::Pattern, 15), Some(-0.6));
        let later = scorer.reading(Component::Pattern, 20).unwrap();
        assert_eq!(later.value, -0.9);
        assert_eq!(
            later.evidence,
            Evidence::Pattern {
                active: vec![(PatternKind::DoubleTop, Direction::Bearish, 0.9)]
            }
        );
    }

    #[test]
    fn opposing_patterns_cancel() {
        let bars = make_bars(&[100.0; 30]);
        let scan = scan_of(
            vec![],
            vec![
                candidate(PatternKind::DoubleTop, Direction::Bearish, (2, 10), 0.7),
                candidate(PatternKind::DoubleBottom, Direction::Bullish, (4, 11), 0.5),
            ],
        );
        let indicators = IndicatorSet::default();
        let params = ScorerParams::default();
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);
        assert_eq!(value_at(&scorer, Component::Pattern, 11), Some(0.0));
    }

    #[test]
    fn nearby_support_votes_with_its_confidence() {
        let bars = make_bars(&[100.0; 30]);
        let pivots = vec![
            Pivot {
                index: 5,
                price: 99.5,
                kind: PivotKind::Low,
            },
            Pivot {
                index: 10,
                price: 99.8,
                kind: PivotKind::Low,
            },
        ];
        let scan = scan_of(pivots.clone(), vec![]);
        let indicators = IndicatorSet::default();
        let params = ScorerParams::default();
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        // second touch is confirmed at 10 + pivot_radius
        assert_eq!(value_at(&scorer, Component::SupportResistance, 12), None);
        let reading = scorer.reading(Component::SupportResistance, 13).unwrap();
        let expected = find_levels(&pivots, 100.0, 13, &pattern_params)[0].confidence;
        assert!(reading.value > 0.0);
        assert!((reading.value - expected).abs() < 1e-12);
        assert!(matches!(
            reading.evidence,
            Evidence::Level {
                kind: LevelKind::Support,
                ..
            }
        ));
    }

    #[test]
    fn nearby_resistance_votes_bearish_and_distant_level_is_silent() {
        let mut closes = vec![100.0; 30];
        closes[20] = 110.0;
        let bars = make_bars(&closes);
        let pivots = vec![
            Pivot {
                index: 5,
                price: 100.5,
                kind: PivotKind::High,
            },
            Pivot {
                index: 10,
                price: 100.6,
                kind: PivotKind::High,
            },
        ];
        let scan = scan_of(pivots.clone(), vec![]);
        let indicators = IndicatorSet::default();
        let params = ScorerParams::default();
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        let expected = find_levels(&pivots, 100.0, 15, &pattern_params)[0].confidence;
        let value = value_at(&scorer, Component::SupportResistance, 15).unwrap();
        assert!((value + expected).abs() < 1e-12);
        assert_eq!(value_at(&scorer, Component::SupportResistance, 20), None);
    }

    #[test]
    fn rsi_extremes_vote_against_the_move() {
        let bars = make_bars(&[100.0; 4]);
        let params = ScorerParams::default();
        let indicators = indicators_of(vec![(
            params.rsi(),
            vec![
                Some(IndicatorValue::simple(25.0)),
                Some(IndicatorValue::simple(75.0)),
                Some(IndicatorValue::simple(50.0)),
                None,
            ],
        )]);
        let scan = scan_of(vec![], vec![]);
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        assert_eq!(value_at(&scorer, Component::Oscillator, 0), Some(1.0));
        assert_eq!(value_at(&scorer, Component::Oscillator, 1), Some(-1.0));
        assert_eq!(value_at(&scorer, Component::Oscillator, 2), Some(0.0));
        assert_eq!(value_at(&scorer, Component::Oscillator, 3), None);
    }

    #[test]
    fn band_breaches_vote_for_reversion() {
        let bars = make_bars(&[90.0, 110.0, 100.0]);
        let params = ScorerParams::default();
        let band = Some(IndicatorValue::Bands {
            upper: 105.0,
            middle: 100.0,
            lower: 95.0,
        });
        let indicators = indicators_of(vec![(params.bollinger(), vec![band; 3])]);
        let scan = scan_of(vec![], vec![]);
        let pattern_params = PatternParams::default();
        let scorer = Scorer::new(&bars, &indicators, &scan, &params, &pattern_params);

        assert_eq!(value_at(&scorer, Component::Volatility, 0), Some(1.0));
        assert_eq!(value_at(&scorer, Component::Volatility, 1), Some(-1.0));
        assert_eq!(value_at(&scorer, Component::Volatility, 2), Some(0.0));
        assert_eq!(value_at(&scorer, Component::Trend, 0), None);
    }

    #[test]
    fn component_names_parse() {
        for c in Component::ALL {
            assert_eq!(c.name().parse::<Component>(), Ok(c));
        }
        assert!("sentiment".parse::<Component>().is_err());
    }

    #[test]
    fn weights_get_set() {
        let mut w = Weights::default();
        w.set(Component::Volume, 0.25);
        assert!((w.get(Component::Volume) - 0.25).abs() < f64::EPSILON);
        assert!((w.get(Component::Trend) - 2.0).abs() < f64::EPSILON);
    }
}
