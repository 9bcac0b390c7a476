//! JSON report adapter implementing ReportPort.
//!
//! Writes pretty-printed JSON to a file, or to stdout when no path is set.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::analysis::AnalysisReport;
use crate::domain::backtest::BacktestReport;
use crate::domain::error::SamsignalError;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter {
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct BacktestDocument<'a> {
    analysis: &'a AnalysisReport,
    backtest: &'a BacktestReport,
}

impl JsonReportAdapter {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    fn emit<T: Serialize>(&self, document: &T) -> Result<(), SamsignalError> {
        let json = serde_json::to_string_pretty(document).map_err(|e| SamsignalError::Report {
            reason: format!("failed to serialize report: {}", e),
        })?;

        match &self.output {
            Some(path) => {
                fs::write(path, json + "\n").map_err(|e| SamsignalError::Report {
                    reason: format!("failed to write {}: {}", path.display(), e),
                })?;
                tracing::info!(path = %path.display(), "report written");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", json)?;
            }
        }
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_analysis(&self, report: &AnalysisReport) -> Result<(), SamsignalError> {
        self.emit(report)
    }

    fn write_backtest(
        &self,
        analysis: &AnalysisReport,
        backtest: &BacktestReport,
    ) -> Result<(), SamsignalError> {
        self.emit(&BacktestDocument { analysis, backtest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::analyze;
    use crate::domain::backtest::{BacktestConfig, run_backtest};
    use crate::domain::cancel::CancelToken;
    use crate::domain::config_validation::AnalysisConfig;
    use crate::domain::series::{DEFAULT_MAX_GAP_DAYS, Series};
    use crate::domain::testing::make_bars;
    use tempfile::TempDir;

    fn analysis() -> (Series, AnalysisReport) {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64 * 0.5).collect();
        let series = Series::new(make_bars(&closes), DEFAULT_MAX_GAP_DAYS).unwrap();
        let report = analyze(&series, &AnalysisConfig::default(), &CancelToken::new()).unwrap();
        (series, report)
    }

    #[test]
    fn writes_analysis_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        let (_, report) = analysis();

        JsonReportAdapter::new(Some(path.clone()))
            .write_analysis(&report)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["bars"], 40);
        assert_eq!(value["indicators"]["series"][0]["name"], "SMA(5)");
        assert_eq!(value["signals"][0]["index"], 19);
        assert_eq!(value["signals"][0]["direction"], "bullish");
        assert!(value["patterns"]["matches"].is_array());
    }

    #[test]
    fn writes_backtest_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backtest.json");
        let (series, report) = analysis();
        let backtest = run_backtest(
            series.bars(),
            &report.signals,
            &BacktestConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();

        JsonReportAdapter::new(Some(path.clone()))
            .write_backtest(&report, &backtest)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["backtest"]["trades"][0]["exit_reason"], "end_of_data");
        assert_eq!(value["backtest"]["complete"], true);
        assert!(value["backtest"]["metrics"]["sharpe_ratio"].is_number());
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let (_, report) = analysis();
        let err = JsonReportAdapter::new(Some(PathBuf::from("/nonexistent/dir/out.json")))
            .write_analysis(&report)
            .unwrap_err();
        assert!(matches!(err, SamsignalError::Report { .. }));
    }
}
