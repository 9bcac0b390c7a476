//! Report output port trait.

use crate::domain::analysis::AnalysisReport;
use crate::domain::backtest::BacktestReport;
use crate::domain::error::SamsignalError;

/// Port for writing analysis and backtest reports.
pub trait ReportPort {
    fn write_analysis(&self, report: &AnalysisReport) -> Result<(), SamsignalError>;

    fn write_backtest(
        &self,
        analysis: &AnalysisReport,
        backtest: &BacktestReport,
    ) -> Result<(), SamsignalError>;
}
