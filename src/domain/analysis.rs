//! Series → indicators → patterns → signals.
//!
//! [`analyze`] runs the first four stages over one validated series and
//! collects every warning raised on the way. The backtest simulator consumes
//! the resulting signals.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::cancel::CancelToken;
use crate::domain::config_validation::AnalysisConfig;
use crate::domain::error::{SamsignalError, Warning};
use crate::domain::indicator::registry::{IndicatorSet, compute_indicators};
use crate::domain::pattern::{PatternScan, scan_patterns};
use crate::domain::scorer::{CompositeSignal, Explanation, Scorer};
use crate::domain::series::Series;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub bars: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub indicators: IndicatorSet,
    pub patterns: PatternScan,
    pub signals: Vec<CompositeSignal>,
    pub warnings: Vec<Warning>,
    /// False when any stage was cancelled.
    pub complete: bool,
}

impl AnalysisReport {
    /// Most recent signal, if any bar is past the scorer warmup.
    pub fn latest_signal(&self) -> Option<&CompositeSignal> {
        self.signals.last()
    }

    /// Re-derive the per-component reasoning for the signal at `index`.
    pub fn explain(
        &self,
        series: &Series,
        config: &AnalysisConfig,
        index: usize,
    ) -> Option<Explanation> {
        Scorer::new(
            series.bars(),
            &self.indicators,
            &self.patterns,
            &config.scorer,
            &config.patterns,
        )
        .explain(index)
    }
}

/// Run indicators, pattern detection and scoring over `series`.
///
/// Fails only when an indicator request cannot be satisfied by the series
/// length. A cancelled run returns what was finished, marked incomplete.
pub fn analyze(
    series: &Series,
    config: &AnalysisConfig,
    cancel: &CancelToken,
) -> Result<AnalysisReport, SamsignalError> {
    let mut warnings = series.gap_warnings();
    for warning in &warnings {
        tracing::warn!(%warning, "series gap");
    }

    let indicators = compute_indicators(series, &config.indicator_requests())?;
    warnings.extend(indicators.warnings.iter().cloned());

    let patterns = scan_patterns(series, &config.patterns, cancel);
    warnings.extend(patterns.warnings());

    let mut complete = patterns.complete;
    let signals = if cancel.is_cancelled() {
        complete = false;
        let warning = Warning::Incomplete {
            stage: "scoring".to_string(),
        };
        tracing::warn!(%warning, "analysis cancelled");
        warnings.push(warning);
        Vec::new()
    } else {
        Scorer::new(
            series.bars(),
            &indicators,
            &patterns,
            &config.scorer,
            &config.patterns,
        )
        .score_all()
    };

    tracing::info!(
        bars = series.len(),
        indicators = indicators.series.len(),
        patterns = patterns.matches.len(),
        levels = patterns.levels.len(),
        signals = signals.len(),
        warnings = warnings.len(),
        "analysis finished"
    );

    let bars = series.bars();
    Ok(AnalysisReport {
        bars: bars.len(),
        first_date: bars[0].date,
        last_date: bars[bars.len() - 1].date,
        indicators,
        patterns,
        signals,
        warnings,
        complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::direction::Direction;
    use crate::domain::indicator::IndicatorType;
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::series::DEFAULT_MAX_GAP_DAYS;
    use crate::domain::testing::{day, make_bars};

    fn rising(n: usize) -> Series {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        Series::new(make_bars(&closes), DEFAULT_MAX_GAP_DAYS).unwrap()
    }

    #[test]
    fn rising_series_is_bullish_after_warmup() {
        let report = analyze(&rising(50), &AnalysisConfig::default(), &CancelToken::new()).unwrap();

        assert_eq!(report.bars, 50);
        assert_eq!(report.signals.first().map(|s| s.index), Some(19));
        assert_eq!(report.signals.len(), 31);
        assert!(report
            .signals
            .iter()
            .all(|s| s.direction == Direction::Bullish));
        assert!(report.complete);
        assert_eq!(report.latest_signal().map(|s| s.index), Some(49));
    }

    #[test]
    fn short_macd_reported_as_warning() {
        // 30 bars cannot fill MACD(12,26,9)
        let report = analyze(&rising(30), &AnalysisConfig::default(), &CancelToken::new()).unwrap();
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            Warning::InsufficientData { indicator, .. } if indicator == "MACD(12,26,9)"
        )));
    }

    #[test]
    fn gaps_are_reported() {
        let mut bars: Vec<OhlcvBar> = make_bars(&[100.0; 40]);
        for (i, bar) in bars.iter_mut().enumerate().skip(20) {
            bar.date = day(i + 30);
        }
        let series = Series::new(bars, DEFAULT_MAX_GAP_DAYS).unwrap();
        let report = analyze(&series, &AnalysisConfig::default(), &CancelToken::new()).unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::SeriesGap { index: 20, .. })));
    }

    #[test]
    fn period_longer_than_series_is_configuration_error() {
        let config = AnalysisConfig {
            extra_indicators: vec![IndicatorType::Sma(80)],
            ..Default::default()
        };
        let err = analyze(&rising(50), &config, &CancelToken::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn cancelled_analysis_is_incomplete() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = analyze(&rising(50), &AnalysisConfig::default(), &cancel).unwrap();
        assert!(!report.complete);
        assert!(report.signals.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::Incomplete { .. })));
    }

    #[test]
    fn explain_matches_signal() {
        let series = rising(50);
        let config = AnalysisConfig::default();
        let report = analyze(&series, &config, &CancelToken::new()).unwrap();
        let explanation = report.explain(&series, &config, 49).unwrap();
        assert_eq!(&explanation.signal, report.latest_signal().unwrap());
        assert!(report.explain(&series, &config, 3).is_none());
    }
}
