//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::{AnalysisReport, analyze};
use crate::domain::backtest::{BacktestReport, run_backtest};
use crate::domain::cancel::CancelToken;
use crate::domain::config_validation::{AnalysisConfig, load_analysis_config};
use crate::domain::error::SamsignalError;
use crate::domain::series::Series;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "samsignal", about = "Technical-analysis signals and backtests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct DataArgs {
    /// CSV file with date,open,high,low,close,volume rows
    #[arg(short, long)]
    pub data: PathBuf,
    /// INI configuration; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Ignore bars before this date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Ignore bars after this date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators, patterns and signals
    Analyze {
        #[command(flatten)]
        input: DataArgs,
        /// JSON output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze, then replay the signals through the simulator
    Backtest {
        #[command(flatten)]
        input: DataArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the component breakdown of one bar's signal
    Explain {
        #[command(flatten)]
        input: DataArgs,
        /// Bar index; the last bar when omitted
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze { input, output } => run_analyze(&input, output),
        Command::Backtest { input, output } => run_backtest_command(&input, output),
        Command::Explain { input, index } => run_explain(&input, index),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, SamsignalError> {
    match path {
        Some(path) => load_analysis_config(&FileConfigAdapter::from_file(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_series(input: &DataArgs, config: &AnalysisConfig) -> Result<Series, SamsignalError> {
    let bars = CsvAdapter::new(input.data.clone())
        .with_range(input.start, input.end)
        .fetch_bars()?;
    Series::new(bars, config.max_gap_days)
}

/// Shared front half of every data command.
fn run_pipeline(
    input: &DataArgs,
) -> Result<(AnalysisConfig, Series, AnalysisReport), SamsignalError> {
    let config = load_config(input.config.as_deref())?;
    let series = load_series(input, &config)?;
    let report = analyze(&series, &config, &CancelToken::new())?;
    Ok((config, series, report))
}

fn run_analyze(input: &DataArgs, output: Option<PathBuf>) -> Result<(), SamsignalError> {
    let (_, _, report) = run_pipeline(input)?;
    print_analysis_summary(&report);
    JsonReportAdapter::new(output).write_analysis(&report)
}

fn run_backtest_command(input: &DataArgs, output: Option<PathBuf>) -> Result<(), SamsignalError> {
    let (config, series, analysis) = run_pipeline(input)?;
    let backtest = run_backtest(
        series.bars(),
        &analysis.signals,
        &config.backtest,
        &CancelToken::new(),
    )?;
    print_backtest_summary(&backtest);
    JsonReportAdapter::new(output).write_backtest(&analysis, &backtest)
}

fn run_explain(input: &DataArgs, index: Option<usize>) -> Result<(), SamsignalError> {
    let (config, series, report) = run_pipeline(input)?;
    let index = index.unwrap_or(series.len() - 1);
    series.require(index + 1)?;
    match report.explain(&series, &config, index) {
        Some(explanation) => {
            print!("{explanation}");
            Ok(())
        }
        None => Err(SamsignalError::InsufficientData {
            bars: index + 1,
            minimum: config.scorer.warmup() + 1,
        }),
    }
}

fn run_validate(path: &Path) -> Result<(), SamsignalError> {
    let config = load_config(Some(path))?;
    println!("Configuration is valid.");
    println!(
        "  Trend:     {}/{}",
        config.scorer.fast_ma(),
        config.scorer.slow_ma()
    );
    println!("  Indicators: {}", config.indicator_requests().len());
    println!(
        "  Entry/exit: {:.2}/{:.2}",
        config.backtest.entry_threshold, config.backtest.exit_threshold
    );
    Ok(())
}

fn print_analysis_summary(report: &AnalysisReport) {
    eprintln!(
        "Analyzed {} bars ({} to {})",
        report.bars, report.first_date, report.last_date
    );
    eprintln!("  Patterns:  {}", report.patterns.matches.len());
    eprintln!("  Levels:    {}", report.patterns.levels.len());
    eprintln!("  Signals:   {}", report.signals.len());
    if let Some(signal) = report.latest_signal() {
        eprintln!(
            "  Latest:    {} {} (score {:+.3})",
            signal.date, signal.direction, signal.score
        );
    }
    for warning in &report.warnings {
        eprintln!("  warning: {warning}");
    }
}

fn print_backtest_summary(report: &BacktestReport) {
    let m = &report.metrics;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Final Equity:     {:.2}", m.final_equity);
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", report.trades.len());
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    if !report.skipped.is_empty() {
        eprintln!("Skipped Entries:  {}", report.skipped.len());
    }
}
