#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use traderules::domain::error::TraderulesError;
use traderules::domain::record::TradingRecord;
use traderules::domain::rule::{Rule, Verdict};
use traderules::domain::series::{FixedSeries, SharedSeries};

pub fn series(name: &str, values: &[f64]) -> SharedSeries {
    Arc::new(FixedSeries::new(name, values.to_vec()).unwrap())
}

/// A leaf rule with a fixed outcome.
pub struct FlagRule {
    pub satisfied: bool,
    pub label: String,
}

impl FlagRule {
    pub fn boxed(satisfied: bool, label: &str) -> Box<dyn Rule> {
        Box::new(Self {
            satisfied,
            label: label.into(),
        })
    }
}

impl Rule for FlagRule {
    fn evaluate(
        &self,
        _index: usize,
        _record: &TradingRecord,
    ) -> Result<Verdict, TraderulesError> {
        if self.satisfied {
            Ok(Verdict::satisfied_leaf())
        } else {
            Ok(Verdict::unsatisfied())
        }
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// A leaf rule that counts its evaluations.
pub struct CountingRule {
    pub satisfied: bool,
    pub calls: Arc<AtomicUsize>,
}

impl CountingRule {
    pub fn boxed(satisfied: bool) -> (Box<dyn Rule>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                satisfied,
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

impl Rule for CountingRule {
    fn evaluate(
        &self,
        _index: usize,
        _record: &TradingRecord,
    ) -> Result<Verdict, TraderulesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.satisfied {
            Ok(Verdict::satisfied_leaf())
        } else {
            Ok(Verdict::unsatisfied())
        }
    }

    fn description(&self) -> String {
        "counting".into()
    }
}
