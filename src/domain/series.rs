//! Numeric series consumed by rules.
//!
//! A series is addressable by bar index `0..len` and immutable once built.
//! Rules share series through [`SharedSeries`]; reads are concurrent-safe.

use crate::domain::error::TraderulesError;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

pub type SharedSeries = Arc<dyn Series>;

/// A time-indexed numeric series.
pub trait Series: Send + Sync {
    /// Label used in generated rule descriptions.
    fn name(&self) -> String;

    /// Value at `index`. Fails with `IndexOutOfRange` above the last bar.
    fn value_at(&self, index: usize) -> Result<f64, TraderulesError>;
}

impl std::fmt::Debug for dyn Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Series")
            .field("name", &self.name())
            .finish()
    }
}

/// An immutable in-memory series backed by a vector of values.
///
/// Rejects non-finite values at construction so comparisons are total.
#[derive(Debug, Clone)]
pub struct FixedSeries {
    name: String,
    values: Vec<f64>,
}

impl FixedSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Result<Self, TraderulesError> {
        let name = name.into();
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(TraderulesError::Data {
                reason: format!("series '{}' has non-finite value at row {}", name, row),
            });
        }
        Ok(Self { name, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Series for FixedSeries {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn value_at(&self, index: usize) -> Result<f64, TraderulesError> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| TraderulesError::IndexOutOfRange {
                series: self.name.clone(),
                index,
                len: self.values.len(),
            })
    }
}

/// A series with the same value at every index. Backs threshold comparisons.
#[derive(Debug, Clone)]
pub struct ConstantSeries {
    value: f64,
}

impl ConstantSeries {
    pub fn new(value: f64) -> Result<Self, TraderulesError> {
        if !value.is_finite() {
            return Err(TraderulesError::Data {
                reason: format!("non-finite constant: {}", value),
            });
        }
        Ok(Self { value })
    }
}

impl Series for ConstantSeries {
    fn name(&self) -> String {
        self.value.to_string()
    }

    fn value_at(&self, _index: usize) -> Result<f64, TraderulesError> {
        Ok(self.value)
    }
}

/// A set of equal-length named series loaded from one data source, with an
/// optional date label per row.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    pub dates: Option<Vec<NaiveDate>>,
    pub columns: Vec<FixedSeries>,
}

impl SeriesTable {
    pub fn rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Name → series map for resolving identifiers in rule expressions.
    pub fn registry(&self) -> HashMap<String, SharedSeries> {
        self.columns
            .iter()
            .map(|c| (c.name(), Arc::new(c.clone()) as SharedSeries))
            .collect()
    }
}
