//! Threshold combinator: at least N of M sub-rules satisfied.

use crate::domain::error::TraderulesError;
use crate::domain::record::TradingRecord;
use crate::domain::rule::{Rule, Verdict, leaf_label};
use tracing::trace;

/// Aggregates an ordered list of sub-rules under a minimum satisfied count.
///
/// Every sub-rule is evaluated on every call, in declared order, even once the
/// threshold is already met: the trace must reflect the satisfaction state of
/// all sub-rules, not just the ones needed to cross the threshold. Declaration
/// order is also the emission order of the trace.
#[derive(Debug)]
pub struct ThresholdRule {
    rules: Vec<Box<dyn Rule>>,
    required: usize,
}

impl ThresholdRule {
    /// k-of-n form. `required` must be in `1..=rules.len()`.
    pub fn new(rules: Vec<Box<dyn Rule>>, required: usize) -> Result<Self, TraderulesError> {
        if rules.is_empty() {
            return Err(TraderulesError::InvalidRule {
                reason: "combinator needs at least one sub-rule".into(),
            });
        }
        if required < 1 || required > rules.len() {
            return Err(TraderulesError::InvalidRule {
                reason: format!(
                    "required count {} outside 1..={}",
                    required,
                    rules.len()
                ),
            });
        }
        Ok(Self { rules, required })
    }

    /// Satisfied only when every sub-rule is satisfied.
    pub fn all_of(rules: Vec<Box<dyn Rule>>) -> Result<Self, TraderulesError> {
        let required = rules.len();
        Self::new(rules, required)
    }

    /// Satisfied when at least one sub-rule is satisfied.
    pub fn any_of(rules: Vec<Box<dyn Rule>>) -> Result<Self, TraderulesError> {
        Self::new(rules, 1)
    }
}

impl Rule for ThresholdRule {
    fn evaluate(
        &self,
        index: usize,
        record: &TradingRecord,
    ) -> Result<Verdict, TraderulesError> {
        let mut verdicts = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            verdicts.push(rule.evaluate(index, record)?);
        }

        let count = verdicts.iter().filter(|v| v.is_satisfied()).count();
        let satisfied = count >= self.required;
        trace!(rule = %self.description(), index, count, satisfied, "evaluated");

        if !satisfied {
            return Ok(Verdict::unsatisfied());
        }

        let mut entries = Vec::new();
        for (rule, verdict) in self.rules.iter().zip(&verdicts) {
            if !verdict.is_satisfied() {
                continue;
            }
            if rule.is_composite() {
                entries.extend(verdict.trace().iter().cloned());
            } else {
                entries.push(leaf_label(rule.as_ref()));
            }
        }
        Ok(Verdict::satisfied_with(entries))
    }

    fn description(&self) -> String {
        if self.required == self.rules.len() {
            format!("all of {}", self.rules.len())
        } else if self.required == 1 {
            format!("any of {}", self.rules.len())
        } else {
            format!("at least {} of {}", self.required, self.rules.len())
        }
    }

    fn is_composite(&self) -> bool {
        true
    }
}
