//! Analysis configuration: defaults, INI loading and validation.
//!
//! Every key is optional; a missing key keeps its default. Unknown sections
//! or keys, unparsable values and out-of-range values are configuration
//! errors.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SamsignalError;
use crate::domain::execution::Sizing;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::bollinger::multiplier_x100;
use crate::domain::pattern::PatternParams;
use crate::domain::scorer::{Component, MaKind, ScorerParams};
use crate::domain::series::DEFAULT_MAX_GAP_DAYS;
use crate::ports::config_port::ConfigPort;

const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("series", &["max_gap_days"]),
    (
        "indicators",
        &[
            "ma_kind",
            "trend_fast",
            "trend_slow",
            "rsi_period",
            "macd_fast",
            "macd_slow",
            "macd_signal",
            "bollinger_period",
            "bollinger_k",
            "volume_period",
            "extra",
        ],
    ),
    (
        "patterns",
        &[
            "pivot_radius",
            "window",
            "peak_tolerance",
            "min_depth",
            "flat_tolerance",
            "triangle_pivots",
            "fit_weight",
            "volume_weight",
            "level_tolerance",
            "min_touches",
            "recency_half_life",
        ],
    ),
    (
        "scorer",
        &[
            "neutral_threshold",
            "oversold",
            "overbought",
            "pattern_active_bars",
        ],
    ),
    (
        "weights",
        &[
            "trend",
            "momentum",
            "oscillator",
            "volatility",
            "pattern",
            "support_resistance",
            "volume",
        ],
    ),
    (
        "backtest",
        &[
            "initial_capital",
            "sizing",
            "sizing_value",
            "leverage_cap",
            "entry_threshold",
            "exit_threshold",
            "allow_shorting",
            "commission_per_trade",
            "commission_pct",
            "slippage_pct",
            "risk_free_rate",
            "annualization_factor",
            "close_at_end",
        ],
    ),
];

/// Everything one analysis and backtest run needs. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub max_gap_days: i64,
    pub scorer: ScorerParams,
    pub patterns: PatternParams,
    /// Computed and reported, not scored.
    pub extra_indicators: Vec<IndicatorType>,
    pub backtest: BacktestConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_gap_days: DEFAULT_MAX_GAP_DAYS,
            scorer: ScorerParams::default(),
            patterns: PatternParams::default(),
            extra_indicators: Vec::new(),
            backtest: BacktestConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Scorer inputs followed by the extra indicators.
    pub fn indicator_requests(&self) -> Vec<IndicatorType> {
        let mut requests = self.scorer.required_indicators();
        requests.extend(self.extra_indicators.iter().cloned());
        requests
    }

    pub fn validate(&self) -> Result<(), SamsignalError> {
        if self.max_gap_days < 1 {
            return Err(SamsignalError::invalid(
                "series",
                "max_gap_days",
                "must be at least 1",
            ));
        }
        validate_scorer(&self.scorer)?;
        validate_patterns(&self.patterns)?;
        self.backtest.validate()
    }
}

/// Read, range-check and assemble the configuration behind `config`.
pub fn load_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, SamsignalError> {
    check_known_keys(config)?;

    let mut result = AnalysisConfig::default();

    if let Some(v) = config.get_int("series", "max_gap_days")? {
        result.max_gap_days = v;
    }

    read_indicators(config, &mut result)?;
    read_patterns(config, &mut result.patterns)?;
    read_scorer(config, &mut result.scorer)?;
    read_backtest(config, &mut result.backtest)?;

    result.validate()?;
    tracing::debug!(
        extra_indicators = result.extra_indicators.len(),
        "configuration loaded"
    );
    Ok(result)
}

fn check_known_keys(config: &dyn ConfigPort) -> Result<(), SamsignalError> {
    for section in config.sections() {
        let known = KNOWN_KEYS
            .iter()
            .find(|(name, _)| *name == section)
            .map(|(_, keys)| *keys)
            .ok_or_else(|| SamsignalError::ConfigUnknownSection {
                section: section.clone(),
            })?;
        for key in config.keys(&section) {
            if !known.contains(&key.as_str()) {
                return Err(SamsignalError::ConfigUnknownKey {
                    section: section.clone(),
                    key,
                });
            }
        }
    }
    Ok(())
}

fn get_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, SamsignalError> {
    match config.get_int(section, key)? {
        None => Ok(None),
        Some(v) => usize::try_from(v).map(Some).map_err(|_| {
            SamsignalError::invalid(section, key, format!("must not be negative, got {}", v))
        }),
    }
}

fn set_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    slot: &mut usize,
) -> Result<(), SamsignalError> {
    if let Some(v) = get_usize(config, section, key)? {
        *slot = v;
    }
    Ok(())
}

fn set_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    slot: &mut f64,
) -> Result<(), SamsignalError> {
    if let Some(v) = config.get_double(section, key)? {
        *slot = v;
    }
    Ok(())
}

fn set_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    slot: &mut bool,
) -> Result<(), SamsignalError> {
    if let Some(v) = config.get_bool(section, key)? {
        *slot = v;
    }
    Ok(())
}

fn read_indicators(
    config: &dyn ConfigPort,
    result: &mut AnalysisConfig,
) -> Result<(), SamsignalError> {
    const S: &str = "indicators";
    let scorer = &mut result.scorer;

    if let Some(kind) = config.get_string(S, "ma_kind") {
        scorer.ma_kind = kind
            .parse::<MaKind>()
            .map_err(|reason| SamsignalError::invalid(S, "ma_kind", reason))?;
    }
    set_usize(config, S, "trend_fast", &mut scorer.trend_fast)?;
    set_usize(config, S, "trend_slow", &mut scorer.trend_slow)?;
    set_usize(config, S, "rsi_period", &mut scorer.rsi_period)?;
    set_usize(config, S, "macd_fast", &mut scorer.macd_fast)?;
    set_usize(config, S, "macd_slow", &mut scorer.macd_slow)?;
    set_usize(config, S, "macd_signal", &mut scorer.macd_signal)?;
    set_usize(config, S, "bollinger_period", &mut scorer.bollinger_period)?;
    set_usize(config, S, "volume_period", &mut scorer.volume_period)?;

    if let Some(k) = config.get_double(S, "bollinger_k")? {
        scorer.bollinger_mult_x100 =
            multiplier_x100(k).map_err(|reason| SamsignalError::invalid(S, "bollinger_k", reason))?;
    }

    if let Some(extra) = config.get_string(S, "extra") {
        result.extra_indicators = split_top_level(&extra)
            .into_iter()
            .map(|spec| {
                spec.parse::<IndicatorType>()
                    .map_err(|reason| SamsignalError::invalid(S, "extra", reason))
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(())
}

/// Split `SMA(50), MACD(12,26,9)` on commas outside parentheses.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn read_patterns(config: &dyn ConfigPort, p: &mut PatternParams) -> Result<(), SamsignalError> {
    const S: &str = "patterns";
    set_usize(config, S, "pivot_radius", &mut p.pivot_radius)?;
    set_usize(config, S, "window", &mut p.window)?;
    set_double(config, S, "peak_tolerance", &mut p.peak_tolerance)?;
    set_double(config, S, "min_depth", &mut p.min_depth)?;
    set_double(config, S, "flat_tolerance", &mut p.flat_tolerance)?;
    set_usize(config, S, "triangle_pivots", &mut p.triangle_pivots)?;
    set_double(config, S, "fit_weight", &mut p.fit_weight)?;
    set_double(config, S, "volume_weight", &mut p.volume_weight)?;
    set_double(config, S, "level_tolerance", &mut p.level_tolerance)?;
    set_usize(config, S, "min_touches", &mut p.min_touches)?;
    set_double(config, S, "recency_half_life", &mut p.recency_half_life)?;
    Ok(())
}

fn read_scorer(config: &dyn ConfigPort, s: &mut ScorerParams) -> Result<(), SamsignalError> {
    set_double(config, "scorer", "neutral_threshold", &mut s.neutral_threshold)?;
    set_double(config, "scorer", "oversold", &mut s.oversold)?;
    set_double(config, "scorer", "overbought", &mut s.overbought)?;
    set_usize(config, "scorer", "pattern_active_bars", &mut s.pattern_active_bars)?;

    for component in Component::ALL {
        if let Some(w) = config.get_double("weights", component.name())? {
            s.weights.set(component, w);
        }
    }
    Ok(())
}

fn read_backtest(config: &dyn ConfigPort, b: &mut BacktestConfig) -> Result<(), SamsignalError> {
    const S: &str = "backtest";
    set_double(config, S, "initial_capital", &mut b.initial_capital)?;
    set_double(config, S, "leverage_cap", &mut b.leverage_cap)?;
    set_double(config, S, "entry_threshold", &mut b.entry_threshold)?;
    set_double(config, S, "exit_threshold", &mut b.exit_threshold)?;
    set_bool(config, S, "allow_shorting", &mut b.allow_shorting)?;
    set_double(config, S, "commission_per_trade", &mut b.commission_per_trade)?;
    set_double(config, S, "commission_pct", &mut b.commission_pct)?;
    set_double(config, S, "slippage_pct", &mut b.slippage_pct)?;
    set_double(config, S, "risk_free_rate", &mut b.risk_free_rate)?;
    set_double(config, S, "annualization_factor", &mut b.annualization_factor)?;
    set_bool(config, S, "close_at_end", &mut b.close_at_end)?;

    let mode = config.get_string(S, "sizing");
    let value = config.get_double(S, "sizing_value")?;
    b.sizing = match (mode.as_deref().map(str::trim), value) {
        (None, None) => b.sizing,
        (None | Some("fixed_fraction"), Some(v)) => Sizing::FixedFraction(v),
        (Some("fixed_fraction"), None) => Sizing::default(),
        (Some("fixed_quantity"), Some(v)) => {
            if v.fract() != 0.0 {
                return Err(SamsignalError::invalid(
                    S,
                    "sizing_value",
                    format!("quantity must be a whole number, got {}", v),
                ));
            }
            Sizing::FixedQuantity(v as i64)
        }
        (Some("fixed_quantity"), None) => {
            return Err(SamsignalError::invalid(
                S,
                "sizing_value",
                "required when sizing = fixed_quantity",
            ));
        }
        (Some(other), _) => {
            return Err(SamsignalError::invalid(
                S,
                "sizing",
                format!("expected fixed_fraction or fixed_quantity, got '{}'", other),
            ));
        }
    };
    Ok(())
}

fn validate_scorer(s: &ScorerParams) -> Result<(), SamsignalError> {
    const S: &str = "indicators";
    for (key, value) in [
        ("trend_fast", s.trend_fast),
        ("rsi_period", s.rsi_period),
        ("macd_fast", s.macd_fast),
        ("macd_signal", s.macd_signal),
        ("bollinger_period", s.bollinger_period),
        ("volume_period", s.volume_period),
    ] {
        if value == 0 {
            return Err(SamsignalError::invalid(S, key, "must be at least 1"));
        }
    }
    if s.trend_slow <= s.trend_fast {
        return Err(SamsignalError::invalid(
            S,
            "trend_slow",
            format!("{} must exceed trend_fast {}", s.trend_slow, s.trend_fast),
        ));
    }
    if s.macd_slow <= s.macd_fast {
        return Err(SamsignalError::invalid(
            S,
            "macd_slow",
            format!("{} must exceed macd_fast {}", s.macd_slow, s.macd_fast),
        ));
    }
    if s.bollinger_mult_x100 == 0 {
        return Err(SamsignalError::invalid(S, "bollinger_k", "must be positive"));
    }

    if !(0.0..=100.0).contains(&s.oversold)
        || !(0.0..=100.0).contains(&s.overbought)
        || s.oversold >= s.overbought
    {
        return Err(SamsignalError::invalid(
            "scorer",
            "oversold",
            format!(
                "need 0 <= oversold < overbought <= 100, got {} and {}",
                s.oversold, s.overbought
            ),
        ));
    }
    if !(0.0..1.0).contains(&s.neutral_threshold) {
        return Err(SamsignalError::invalid(
            "scorer",
            "neutral_threshold",
            format!("must be within [0, 1), got {}", s.neutral_threshold),
        ));
    }

    for component in Component::ALL {
        let w = s.weights.get(component);
        if !(w.is_finite() && w >= 0.0) {
            return Err(SamsignalError::invalid(
                "weights",
                component.name(),
                format!("must be zero or more, got {}", w),
            ));
        }
    }
    Ok(())
}

fn validate_patterns(p: &PatternParams) -> Result<(), SamsignalError> {
    const S: &str = "patterns";
    if p.pivot_radius == 0 {
        return Err(SamsignalError::invalid(S, "pivot_radius", "must be at least 1"));
    }
    if p.window < 2 {
        return Err(SamsignalError::invalid(S, "window", "must be at least 2"));
    }
    if p.triangle_pivots < 4 {
        return Err(SamsignalError::invalid(
            S,
            "triangle_pivots",
            "must be at least 4",
        ));
    }
    if p.min_touches == 0 {
        return Err(SamsignalError::invalid(S, "min_touches", "must be at least 1"));
    }
    for (key, value) in [
        ("peak_tolerance", p.peak_tolerance),
        ("min_depth", p.min_depth),
        ("flat_tolerance", p.flat_tolerance),
        ("level_tolerance", p.level_tolerance),
        ("fit_weight", p.fit_weight),
        ("volume_weight", p.volume_weight),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(SamsignalError::invalid(
                S,
                key,
                format!("must be within [0, 1], got {}", value),
            ));
        }
    }
    if p.fit_weight + p.volume_weight <= 0.0 {
        return Err(SamsignalError::invalid(
            S,
            "fit_weight",
            "fit_weight and volume_weight cannot both be zero",
        ));
    }
    if !(p.recency_half_life.is_finite() && p.recency_half_life > 0.0) {
        return Err(SamsignalError::invalid(
            S,
            "recency_half_life",
            format!("must be positive, got {}", p.recency_half_life),
        ));
    }
    Ok(())
}
