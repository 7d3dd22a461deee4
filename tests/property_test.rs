//! Property tests for the threshold combinator.

mod common;

use common::FlagRule;
use proptest::prelude::*;
use traderules::domain::record::TradingRecord;
use traderules::domain::rule::Rule;
use traderules::domain::rule::threshold::ThresholdRule;

proptest! {
    /// k-of-n is satisfied exactly when the number of true sub-rules reaches k.
    #[test]
    fn threshold_matches_satisfied_count(
        (flags, required) in proptest::collection::vec(any::<bool>(), 1..8)
            .prop_flat_map(|v| {
                let len = v.len();
                (Just(v), 1..=len)
            })
    ) {
        let rules: Vec<Box<dyn Rule>> = flags
            .iter()
            .enumerate()
            .map(|(i, &satisfied)| FlagRule::boxed(satisfied, &format!("leaf {i}")))
            .collect();
        let count = flags.iter().filter(|&&f| f).count();

        let rule = ThresholdRule::new(rules, required).unwrap();
        let verdict = rule.evaluate(0, &TradingRecord::new()).unwrap();

        prop_assert_eq!(verdict.is_satisfied(), count >= required);
    }

    /// When satisfied, the trace lists every true leaf in declaration order.
    #[test]
    fn trace_lists_true_leaves_in_order(
        flags in proptest::collection::vec(any::<bool>(), 1..8)
    ) {
        prop_assume!(flags.iter().any(|&f| f));

        let rules: Vec<Box<dyn Rule>> = flags
            .iter()
            .enumerate()
            .map(|(i, &satisfied)| FlagRule::boxed(satisfied, &format!("leaf {i}")))
            .collect();

        let rule = ThresholdRule::any_of(rules).unwrap();
        let verdict = rule.evaluate(0, &TradingRecord::new()).unwrap();

        let expected: Vec<String> = flags
            .iter()
            .enumerate()
            .filter(|&(_, &satisfied)| satisfied)
            .map(|(i, _)| format!("[leaf {i}]"))
            .collect();

        prop_assert!(verdict.is_satisfied());
        prop_assert_eq!(verdict.trace(), expected.as_slice());
    }
}
