//! CSV file data adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`
//! records, dates as `YYYY-MM-DD`. Rows are returned in file order.

use crate::domain::error::SamsignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    path: PathBuf,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            start_date: None,
            end_date: None,
        }
    }

    /// Keep only rows dated within `[start, end]` (either bound optional).
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    column: usize,
    name: &str,
    line: u64,
) -> Result<T, SamsignalError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(column).ok_or_else(|| SamsignalError::DataSource {
        reason: format!("line {}: missing {} column", line, name),
    })?;
    raw.trim().parse().map_err(|e| SamsignalError::DataSource {
        reason: format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<OhlcvBar>, SamsignalError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SamsignalError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SamsignalError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str: String = parse_field(&record, 0, "date", line)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                SamsignalError::DataSource {
                    reason: format!("line {}: invalid date '{}': {}", line, date_str, e),
                }
            })?;

            if !self.in_range(date) {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        tracing::debug!(path = %self.path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}
