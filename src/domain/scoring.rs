//! Rule-based strength scoring.
//!
//! A `RuleSet` is an ordered list of `(ScoreRule, weight)` pairs. Each rule is
//! evaluated independently against one bar of an `AnnotatedSeries`; the score
//! is the sum of weights of the rules that hold, capped at 100.
//!
//! An undefined input always makes its rule false.

use crate::domain::snapshot::{AnnotatedSeries, IndicatorSnapshot};
use std::fmt;

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreRule {
    /// MA20 > MA50
    Trend,
    /// close >= High20Shifted
    Breakout,
    /// MA20 < close < High20Shifted
    Pullback,
    /// volume / VolMA20 > min_ratio
    VolumeSurge { min_ratio: f64 },
    /// CMF20 > 0
    PositiveMoneyFlow,
    /// lower < RSI14 < upper
    HealthyMomentum { lower: f64, upper: f64 },
    /// MA20 at least `min_pct` percent above its value `lookback` bars earlier
    RisingSlope { lookback: usize, min_pct: f64 },
    /// close > MA20
    CloseAboveMa20,
    /// close > MA50
    CloseAboveMa50,
    /// MA20 > MA20 `lookback` bars earlier
    Ma20Rising { lookback: usize },
}

impl ScoreRule {
    pub fn evaluate(&self, series: &AnnotatedSeries, snap: &IndicatorSnapshot) -> bool {
        let close = snap.close;
        match self {
            ScoreRule::Trend => matches!((snap.ma20, snap.ma50), (Some(f), Some(s)) if f > s),
            ScoreRule::Breakout => breakout(snap),
            ScoreRule::Pullback => pullback(snap),
            ScoreRule::VolumeSurge { min_ratio } => {
                snap.vol_ma20.is_some_and(|v| v > 0.0) && snap.volume_ratio() > *min_ratio
            }
            ScoreRule::PositiveMoneyFlow => snap.cmf20.is_some_and(|c| c > 0.0),
            ScoreRule::HealthyMomentum { lower, upper } => {
                snap.rsi14.is_some_and(|r| r > *lower && r < *upper)
            }
            ScoreRule::RisingSlope { lookback, min_pct } => {
                match (snap.ma20, earlier_ma20(series, snap.index, *lookback)) {
                    (Some(now), Some(then)) if then > 0.0 => {
                        (now - then) / then * 100.0 >= *min_pct
                    }
                    _ => false,
                }
            }
            ScoreRule::CloseAboveMa20 => snap.ma20.is_some_and(|m| close > m),
            ScoreRule::CloseAboveMa50 => snap.ma50.is_some_and(|m| close > m),
            ScoreRule::Ma20Rising { lookback } => {
                match (snap.ma20, earlier_ma20(series, snap.index, *lookback)) {
                    (Some(now), Some(then)) => now > then,
                    _ => false,
                }
            }
        }
    }
}

fn earlier_ma20(series: &AnnotatedSeries, index: usize, lookback: usize) -> Option<f64> {
    if lookback == 0 {
        return None;
    }
    index.checked_sub(lookback).and_then(|i| series.ma20(i))
}

fn breakout(snap: &IndicatorSnapshot) -> bool {
    snap.high20_shifted.is_some_and(|h| snap.close >= h)
}

fn pullback(snap: &IndicatorSnapshot) -> bool {
    match (snap.ma20, snap.high20_shifted) {
        (Some(ma), Some(high)) => ma < snap.close && snap.close < high,
        _ => false,
    }
}

impl fmt::Display for ScoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRule::Trend => write!(f, "TREND"),
            ScoreRule::Breakout => write!(f, "BREAKOUT"),
            ScoreRule::Pullback => write!(f, "PULLBACK"),
            ScoreRule::VolumeSurge { min_ratio } => write!(f, "VOLUME_SURGE({})", min_ratio),
            ScoreRule::PositiveMoneyFlow => write!(f, "MONEY_FLOW"),
            ScoreRule::HealthyMomentum { lower, upper } => {
                write!(f, "MOMENTUM({},{})", lower, upper)
            }
            ScoreRule::RisingSlope { lookback, min_pct } => {
                write!(f, "SLOPE({},{})", lookback, min_pct)
            }
            ScoreRule::CloseAboveMa20 => write!(f, "ABOVE_MA20"),
            ScoreRule::CloseAboveMa50 => write!(f, "ABOVE_MA50"),
            ScoreRule::Ma20Rising { lookback } => write!(f, "MA20_RISING({})", lookback),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRule {
    pub rule: ScoreRule,
    pub weight: u32,
}

impl fmt::Display for WeightedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rule, self.weight)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<WeightedRule>,
}

impl RuleSet {
    /// Trend 20, breakout 25, pullback 10, volume surge 15, money flow 15,
    /// momentum 10, and optionally the MA20 slope rule for 10 more.
    pub fn standard(with_slope: bool) -> Self {
        let mut rules = vec![
            weighted(ScoreRule::Trend, 20),
            weighted(ScoreRule::Breakout, 25),
            weighted(ScoreRule::Pullback, 10),
            weighted(ScoreRule::VolumeSurge { min_ratio: 1.5 }, 15),
            weighted(ScoreRule::PositiveMoneyFlow, 15),
            weighted(
                ScoreRule::HealthyMomentum {
                    lower: 50.0,
                    upper: 70.0,
                },
                10,
            ),
        ];
        if with_slope {
            rules.push(weighted(
                ScoreRule::RisingSlope {
                    lookback: 5,
                    min_pct: 1.5,
                },
                10,
            ));
        }
        Self { rules }
    }

    /// Price-location rule set: close above MA20 and MA50, breakout over the
    /// shifted 20-bar high, volume surge, and a rising MA20.
    pub fn legacy() -> Self {
        Self {
            rules: vec![
                weighted(ScoreRule::CloseAboveMa20, 20),
                weighted(ScoreRule::Breakout, 25),
                weighted(ScoreRule::CloseAboveMa50, 15),
                weighted(ScoreRule::VolumeSurge { min_ratio: 1.5 }, 20),
                weighted(ScoreRule::Ma20Rising { lookback: 4 }, 20),
            ],
        }
    }

    /// Sum of all weights, capped at `MAX_SCORE`.
    pub fn max_attainable(&self) -> u32 {
        self.rules
            .iter()
            .fold(0u32, |acc, r| acc.saturating_add(r.weight))
            .min(MAX_SCORE)
    }

    /// Score bar `index` of `series`. Returns `None` when the index is out of range.
    pub fn score(&self, series: &AnnotatedSeries, index: usize) -> Option<Score> {
        let snap = series.snapshot(index)?;
        Some(self.score_snapshot(series, &snap))
    }

    pub fn score_snapshot(&self, series: &AnnotatedSeries, snap: &IndicatorSnapshot) -> Score {
        if snap.corrupt {
            return Score {
                value: 0,
                breakout: false,
                pullback: false,
                volume_ratio: 0.0,
            };
        }

        let total: u32 = self
            .rules
            .iter()
            .filter(|r| r.rule.evaluate(series, snap))
            .fold(0, |acc, r| acc.saturating_add(r.weight));

        Score {
            value: total.min(MAX_SCORE),
            breakout: breakout(snap),
            pullback: pullback(snap),
            volume_ratio: snap.volume_ratio(),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::standard(false)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

fn weighted(rule: ScoreRule, weight: u32) -> WeightedRule {
    WeightedRule { rule, weight }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: u32,
    pub breakout: bool,
    pub pullback: bool,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Basic,
    Strong,
    Elite,
}

impl Tier {
    pub fn classify(score: u32) -> Option<Tier> {
        match score {
            80.. => Some(Tier::Elite),
            70..=79 => Some(Tier::Strong),
            60..=69 => Some(Tier::Basic),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Basic => write!(f, "BASIC"),
            Tier::Strong => write!(f, "STRONG"),
            Tier::Elite => write!(f, "ELITE"),
        }
    }
}
