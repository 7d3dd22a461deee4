//! Rule expression parser.
//!
//! Recursive descent over the rule grammar. Series identifiers resolve
//! against the registry of loaded series; bare numbers become constant
//! series. Errors carry the character offset of the problem.
//!
//! Grammar:
//!
//! ```text
//! rule    := UNDER(operand, operand [, window]) | ATLEAST(k, rule, ...)
//!          | ALL(rule, ...) | ANY(rule, ...)
//! operand := number | series name
//! ```

use crate::domain::error::{ParseError, TraderulesError};
use crate::domain::rule::Rule;
use crate::domain::rule::threshold::ThresholdRule;
use crate::domain::rule::under::UnderRule;
use crate::domain::series::{ConstantSeries, SharedSeries};
use std::collections::HashMap;
use std::sync::Arc;

pub type SeriesRegistry = HashMap<String, SharedSeries>;

/// Parse a rule expression, resolving series names against `registry`.
pub fn parse_rule(
    input: &str,
    registry: &SeriesRegistry,
) -> Result<Box<dyn Rule>, TraderulesError> {
    let mut parser = Parser::new(input, registry);
    let rule = parser.parse_rule()?;
    parser.skip_whitespace();
    if !parser.remaining().is_empty() {
        return Err(ParseError {
            message: format!("unexpected trailing input '{}'", parser.peek_word()),
            position: parser.pos,
        }
        .into());
    }
    Ok(rule)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    registry: &'a SeriesRegistry,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, registry: &'a SeriesRegistry) -> Self {
        Self {
            input,
            pos: 0,
            registry,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected integer".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_operand(&mut self) -> Result<SharedSeries, TraderulesError> {
        self.skip_whitespace();

        if matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || ch == '-') {
            let value = self.parse_number()?;
            return Ok(Arc::new(ConstantSeries::new(value)?));
        }

        let start = self.pos;
        let word = self.peek_word();
        if word.is_empty() || !word.chars().next().is_some_and(|c| c.is_alphabetic()) {
            return Err(ParseError {
                message: format!("expected series name or number, found '{}'", word),
                position: start,
            }
            .into());
        }
        self.pos += word.len();

        match self.registry.get(&word) {
            Some(series) => Ok(series.clone()),
            None => Err(TraderulesError::UnknownSeries { name: word }),
        }
    }

    fn parse_rule(&mut self) -> Result<Box<dyn Rule>, TraderulesError> {
        self.skip_whitespace();

        if self.consume_exact("UNDER(") {
            let left = self.parse_operand()?;
            self.expect_char(',')?;
            let right = self.parse_operand()?;

            self.skip_whitespace();
            let window = if self.peek() == Some(',') {
                self.advance();
                self.parse_integer()?
            } else {
                1
            };
            self.expect_char(')')?;
            return Ok(Box::new(UnderRule::new(left, right, window)?));
        }

        if self.consume_exact("ATLEAST(") {
            let required = self.parse_integer()?;
            self.expect_char(',')?;
            let rules = self.parse_rule_list()?;
            return Ok(Box::new(ThresholdRule::new(rules, required)?));
        }

        if self.consume_exact("ALL(") {
            let rules = self.parse_rule_list()?;
            return Ok(Box::new(ThresholdRule::all_of(rules)?));
        }

        if self.consume_exact("ANY(") {
            let rules = self.parse_rule_list()?;
            return Ok(Box::new(ThresholdRule::any_of(rules)?));
        }

        Err(ParseError {
            message: format!(
                "expected UNDER, ATLEAST, ALL or ANY, found '{}'",
                self.peek_word()
            ),
            position: self.pos,
        }
        .into())
    }

    /// Comma-separated rules up to and including the closing parenthesis.
    fn parse_rule_list(&mut self) -> Result<Vec<Box<dyn Rule>>, TraderulesError> {
        let mut rules = vec![self.parse_rule()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                    rules.push(self.parse_rule()?);
                }
                Some(')') => {
                    self.advance();
                    return Ok(rules);
                }
                Some(ch) => {
                    return Err(ParseError {
                        message: format!("expected ',' or ')', found '{}'", ch),
                        position: self.pos,
                    }
                    .into());
                }
                None => {
                    return Err(ParseError {
                        message: "expected ',' or ')', found end of input".to_string(),
                        position: self.pos,
                    }
                    .into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::TradingRecord;
    use crate::domain::series::FixedSeries;

    fn registry() -> SeriesRegistry {
        let mut map = SeriesRegistry::new();
        map.insert(
            "close".into(),
            Arc::new(FixedSeries::new("close", vec![5.0, 5.0, 5.0, 5.0]).unwrap())
                as SharedSeries,
        );
        map.insert(
            "sma3".into(),
            Arc::new(FixedSeries::new("sma3", vec![1.0, 2.0, 3.0, 10.0]).unwrap())
                as SharedSeries,
        );
        map
    }

    #[test]
    fn parses_under_with_default_window() {
        let rule = parse_rule("UNDER(close, sma3)", &registry()).unwrap();
        assert_eq!(rule.description(), "close under sma3");

        let record = TradingRecord::new();
        assert!(!rule.evaluate(0, &record).unwrap().is_satisfied());
        assert!(rule.evaluate(3, &record).unwrap().is_satisfied());
    }

    #[test]
    fn parses_under_with_window() {
        let rule = parse_rule("UNDER(close, sma3, 3)", &registry()).unwrap();
        assert_eq!(rule.description(), "close under sma3 within 3");
    }

    #[test]
    fn parses_constant_operand() {
        let rule = parse_rule("UNDER(close, 9.5)", &registry()).unwrap();
        assert_eq!(rule.description(), "close under 9.5");

        let record = TradingRecord::new();
        assert!(rule.evaluate(0, &record).unwrap().is_satisfied());
    }

    #[test]
    fn parses_negative_constant() {
        let rule = parse_rule("UNDER(close, -1)", &registry()).unwrap();
        assert!(!rule.evaluate(0, &TradingRecord::new()).unwrap().is_satisfied());
    }

    #[test]
    fn parses_nested_combinators() {
        let rule = parse_rule(
            "ALL(ANY(UNDER(close, sma3), UNDER(close, 4)), UNDER(close, 100))",
            &registry(),
        )
        .unwrap();
        assert!(rule.is_composite());

        let verdict = rule.evaluate(3, &TradingRecord::new()).unwrap();
        assert!(verdict.is_satisfied());
        assert_eq!(verdict.trace(), ["[close under sma3]", "[close under 100]"]);
    }

    #[test]
    fn parses_atleast() {
        let rule = parse_rule(
            "ATLEAST(2, UNDER(close, 100), UNDER(close, 4), UNDER(close, sma3))",
            &registry(),
        )
        .unwrap();
        assert_eq!(rule.description(), "at least 2 of 3");

        let record = TradingRecord::new();
        // index 0: only "close under 100" fires
        assert!(!rule.evaluate(0, &record).unwrap().is_satisfied());
        // index 3: "close under 100" and "close under sma3" fire
        assert!(rule.evaluate(3, &record).unwrap().is_satisfied());
    }

    #[test]
    fn whitespace_is_insignificant() {
        let rule = parse_rule("  ANY( UNDER( close , sma3 , 2 ) )  ", &registry()).unwrap();
        assert!(rule.evaluate(3, &TradingRecord::new()).unwrap().is_satisfied());
    }

    #[test]
    fn unknown_series_is_reported_by_name() {
        let err = parse_rule("UNDER(close, bogus)", &registry()).unwrap_err();
        match err {
            TraderulesError::UnknownSeries { name } => assert_eq!(name, "bogus"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_keyword_has_position() {
        let err = parse_rule("BETWEEN(close, 1, 2)", &registry()).unwrap_err();
        match err {
            TraderulesError::RuleParse(parse) => {
                assert_eq!(parse.position, 0);
                assert!(parse.message.contains("BETWEEN"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = parse_rule("UNDER(close, sma3) garbage", &registry()).unwrap_err();
        assert!(matches!(err, TraderulesError::RuleParse(_)));
    }

    #[test]
    fn missing_close_paren_is_rejected() {
        let err = parse_rule("ALL(UNDER(close, sma3)", &registry()).unwrap_err();
        assert!(matches!(err, TraderulesError::RuleParse(_)));
    }

    #[test]
    fn atleast_zero_is_invalid_rule() {
        let err = parse_rule("ATLEAST(0, UNDER(close, sma3))", &registry()).unwrap_err();
        assert!(matches!(err, TraderulesError::InvalidRule { .. }));
    }

    #[test]
    fn atleast_above_count_is_invalid_rule() {
        let err = parse_rule("ATLEAST(3, UNDER(close, sma3), UNDER(close, 1))", &registry())
            .unwrap_err();
        assert!(matches!(err, TraderulesError::InvalidRule { .. }));
    }

    #[test]
    fn zero_window_is_invalid_rule() {
        let err = parse_rule("UNDER(close, sma3, 0)", &registry()).unwrap_err();
        assert!(matches!(err, TraderulesError::InvalidRule { .. }));
    }

    #[test]
    fn parse_error_context_points_at_error() {
        let input = "UNDER(close sma3)";
        let err = parse_rule(input, &registry()).unwrap_err();
        let TraderulesError::RuleParse(parse) = err else {
            panic!("expected parse error");
        };
        let display = parse.display_with_context(input);
        assert!(display.contains('^'));
        assert!(display.lines().next().unwrap().contains("UNDER"));
    }
}
