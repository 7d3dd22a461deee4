//! Rule contract and evaluation verdicts.
//!
//! A rule is a predicate evaluable at a bar index. Composite rules aggregate
//! sub-rules and report which leaves made them fire through an ordered trace.
//! Evaluation returns a fresh [`Verdict`] per call; rule instances hold no
//! evaluation state and are freely shareable across threads.

pub mod under;
pub mod threshold;

use crate::domain::error::TraderulesError;
use crate::domain::record::TradingRecord;

/// Outcome of a single rule evaluation.
///
/// The trace is empty whenever the rule was not satisfied, and always empty
/// for leaf rules: leaves are labeled by the enclosing combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    satisfied: bool,
    trace: Vec<String>,
}

impl Verdict {
    pub fn unsatisfied() -> Self {
        Self {
            satisfied: false,
            trace: Vec::new(),
        }
    }

    pub fn satisfied_with(trace: Vec<String>) -> Self {
        Self {
            satisfied: true,
            trace,
        }
    }

    /// Satisfied verdict with no trace of its own — the leaf form.
    pub fn satisfied_leaf() -> Self {
        Self::satisfied_with(Vec::new())
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// Descriptions of the satisfied leaves, in left-to-right sub-rule order.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<String> {
        self.trace
    }
}

/// A predicate evaluable at a series index.
pub trait Rule: Send + Sync {
    /// Evaluate at `index` against the position history.
    ///
    /// Errors from series access propagate unchanged; no partial results.
    fn evaluate(
        &self,
        index: usize,
        record: &TradingRecord,
    ) -> Result<Verdict, TraderulesError>;

    /// Human-readable label, used in traces.
    fn description(&self) -> String;

    /// Whether this rule aggregates sub-rules. Combinators flatten a
    /// composite sub-rule's verdict trace instead of labeling the composite
    /// itself.
    fn is_composite(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("description", &self.description())
            .field("is_composite", &self.is_composite())
            .finish()
    }
}

/// Trace entry for a satisfied leaf rule.
pub(crate) fn leaf_label(rule: &dyn Rule) -> String {
    format!("[{}]", rule.description())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysTrue;

    impl Rule for AlwaysTrue {
        fn evaluate(
            &self,
            _index: usize,
            _record: &TradingRecord,
        ) -> Result<Verdict, TraderulesError> {
            Ok(Verdict::satisfied_leaf())
        }

        fn description(&self) -> String {
            "always".into()
        }
    }

    #[test]
    fn unsatisfied_verdict_has_empty_trace() {
        let v = Verdict::unsatisfied();
        assert!(!v.is_satisfied());
        assert!(v.trace().is_empty());
    }

    #[test]
    fn satisfied_verdict_carries_trace() {
        let v = Verdict::satisfied_with(vec!["[a]".into(), "[b]".into()]);
        assert!(v.is_satisfied());
        assert_eq!(v.trace(), ["[a]", "[b]"]);
        assert_eq!(v.into_trace(), vec!["[a]".to_string(), "[b]".to_string()]);
    }

    #[test]
    fn rules_are_leaves_by_default() {
        assert!(!AlwaysTrue.is_composite());
    }

    #[test]
    fn leaf_label_wraps_description() {
        assert_eq!(leaf_label(&AlwaysTrue), "[always]");
    }
}
