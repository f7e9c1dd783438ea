//! Rule-set parser.
//!
//! Recursive descent parser turning a textual rule list into a `RuleSet`:
//!
//! ```text
//! rule_set := item (',' item)*
//! item     := rule ':' weight
//! rule     := TREND | BREAKOUT | PULLBACK | MONEY_FLOW | ABOVE_MA20 | ABOVE_MA50
//!           | VOLUME_SURGE '(' number ')'
//!           | MOMENTUM '(' number ',' number ')'
//!           | SLOPE '(' integer ',' number ')'
//!           | MA20_RISING '(' integer ')'
//! ```
//!
//! Keywords are case-insensitive. Weights range from 0 to 100. Errors carry the
//! character offset.

use crate::domain::error::ParseError;
use crate::domain::scoring::{RuleSet, ScoreRule, WeightedRule, MAX_SCORE};

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
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

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            position: self.pos,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn peek_word(&self) -> &'a str {
        let end = self
            .remaining()
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(self.remaining().len());
        &self.remaining()[..end]
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

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
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

    fn parse_rule(&mut self) -> Result<ScoreRule, ParseError> {
        self.skip_whitespace();
        let word = self.peek_word();
        let keyword = word.to_ascii_uppercase();
        let start = self.pos;
        self.pos += word.len();

        let rule = match keyword.as_str() {
            "TREND" => ScoreRule::Trend,
            "BREAKOUT" => ScoreRule::Breakout,
            "PULLBACK" => ScoreRule::Pullback,
            "MONEY_FLOW" => ScoreRule::PositiveMoneyFlow,
            "ABOVE_MA20" => ScoreRule::CloseAboveMa20,
            "ABOVE_MA50" => ScoreRule::CloseAboveMa50,
            "VOLUME_SURGE" => {
                self.expect_char('(')?;
                let min_ratio = self.parse_number()?;
                self.expect_char(')')?;
                ScoreRule::VolumeSurge { min_ratio }
            }
            "MOMENTUM" => {
                self.expect_char('(')?;
                let lower = self.parse_number()?;
                self.expect_char(',')?;
                let upper = self.parse_number()?;
                self.expect_char(')')?;
                if lower >= upper {
                    return Err(ParseError {
                        message: "MOMENTUM lower bound must be below upper bound".to_string(),
                        position: start,
                    });
                }
                ScoreRule::HealthyMomentum { lower, upper }
            }
            "SLOPE" => {
                self.expect_char('(')?;
                let lookback = self.parse_lookback()?;
                self.expect_char(',')?;
                let min_pct = self.parse_number()?;
                self.expect_char(')')?;
                ScoreRule::RisingSlope { lookback, min_pct }
            }
            "MA20_RISING" => {
                self.expect_char('(')?;
                let lookback = self.parse_lookback()?;
                self.expect_char(')')?;
                ScoreRule::Ma20Rising { lookback }
            }
            _ => {
                let found = if word.is_empty() {
                    self.peek()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "end of input".to_string())
                } else {
                    word.to_string()
                };
                return Err(ParseError {
                    message: format!("expected rule name, found '{}'", found),
                    position: start,
                });
            }
        };
        Ok(rule)
    }

    fn parse_lookback(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let lookback = self.parse_integer()?;
        if lookback == 0 {
            return Err(ParseError {
                message: "lookback must be at least 1".to_string(),
                position: start,
            });
        }
        Ok(lookback)
    }

    fn parse_item(&mut self) -> Result<WeightedRule, ParseError> {
        let rule = self.parse_rule()?;
        self.expect_char(':')?;
        self.skip_whitespace();
        let start = self.pos;
        let weight = self.parse_integer()?;
        if weight > MAX_SCORE as usize {
            return Err(ParseError {
                message: format!("weight {} exceeds maximum score {}", weight, MAX_SCORE),
                position: start,
            });
        }
        Ok(WeightedRule {
            rule,
            weight: weight as u32,
        })
    }

    fn parse(&mut self) -> Result<RuleSet, ParseError> {
        let mut rules = vec![self.parse_item()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                    rules.push(self.parse_item()?);
                }
                None => break,
                Some(_) => {
                    return Err(self.error(format!(
                        "unexpected input after rule: '{}'",
                        self.remaining()
                    )));
                }
            }
        }
        Ok(RuleSet { rules })
    }
}

pub fn parse(input: &str) -> Result<RuleSet, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}
