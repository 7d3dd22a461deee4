//! Windowed under-comparison rule.

use crate::domain::error::TraderulesError;
use crate::domain::record::TradingRecord;
use crate::domain::rule::{Rule, Verdict};
use crate::domain::series::{ConstantSeries, SharedSeries};
use std::sync::Arc;
use tracing::trace;

/// Satisfied when the left series dips under the right series anywhere in the
/// trailing window ending at the evaluated index.
///
/// The window at index `i` spans `[max(0, i - window + 1), i]`; indices before
/// the start of the data are never read.
#[derive(Debug)]
pub struct UnderRule {
    left: SharedSeries,
    right: SharedSeries,
    window: usize,
    label: Option<String>,
}

impl UnderRule {
    /// Two-series form. A `window` of 1 compares only the evaluated index.
    pub fn new(
        left: SharedSeries,
        right: SharedSeries,
        window: usize,
    ) -> Result<Self, TraderulesError> {
        if window < 1 {
            return Err(TraderulesError::InvalidRule {
                reason: format!("window must be at least 1, got {}", window),
            });
        }
        Ok(Self {
            left,
            right,
            window,
            label: None,
        })
    }

    /// Compare a series against a fixed threshold.
    pub fn vs_threshold(
        series: SharedSeries,
        threshold: f64,
        window: usize,
    ) -> Result<Self, TraderulesError> {
        let constant = Arc::new(ConstantSeries::new(threshold)?);
        Self::new(series, constant, window)
    }

    /// Override the generated description label.
    pub fn with_description(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Rule for UnderRule {
    fn evaluate(
        &self,
        index: usize,
        _record: &TradingRecord,
    ) -> Result<Verdict, TraderulesError> {
        let start = index.saturating_sub(self.window - 1);
        let mut satisfied = false;
        for j in start..=index {
            if self.left.value_at(j)? < self.right.value_at(j)? {
                satisfied = true;
                break;
            }
        }
        trace!(rule = %self.description(), index, satisfied, "evaluated");
        if satisfied {
            Ok(Verdict::satisfied_leaf())
        } else {
            Ok(Verdict::unsatisfied())
        }
    }

    fn description(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        if self.window == 1 {
            format!("{} under {}", self.left.name(), self.right.name())
        } else {
            format!(
                "{} under {} within {}",
                self.left.name(),
                self.right.name(),
                self.window
            )
        }
    }
}
