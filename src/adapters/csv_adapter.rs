//! CSV series adapter.
//!
//! Loads every column of a CSV file as a named series (header row gives the
//! names). A column named `date` is parsed as ISO dates and kept as row
//! labels rather than a series.

use crate::domain::error::TraderulesError;
use crate::domain::series::{FixedSeries, SeriesTable};
use crate::ports::data_port::SeriesPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SeriesPort for CsvAdapter {
    fn load_table(&self) -> Result<SeriesTable, TraderulesError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TraderulesError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| TraderulesError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() {
            return Err(TraderulesError::Data {
                reason: format!("{} has no columns", self.path.display()),
            });
        }

        let date_column = headers.iter().position(|h| h.eq_ignore_ascii_case("date"));
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut columns: Vec<(String, Vec<f64>)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != date_column)
            .map(|(_, h)| (h.clone(), Vec::new()))
            .collect();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TraderulesError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let mut col = 0;
            for (i, cell) in record.iter().enumerate() {
                if Some(i) == date_column {
                    let date =
                        NaiveDate::parse_from_str(cell.trim(), "%Y-%m-%d").map_err(|e| {
                            TraderulesError::Data {
                                reason: format!("invalid date at row {}: {}", row, e),
                            }
                        })?;
                    dates.push(date);
                } else {
                    let value: f64 = cell.trim().parse().map_err(|_| TraderulesError::Data {
                        reason: format!(
                            "invalid value '{}' in column '{}' at row {}",
                            cell.trim(),
                            columns[col].0,
                            row
                        ),
                    })?;
                    columns[col].1.push(value);
                    col += 1;
                }
            }
        }

        let columns = columns
            .into_iter()
            .map(|(name, values)| FixedSeries::new(name, values))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SeriesTable {
            dates: date_column.map(|_| dates),
            columns,
        })
    }
}
