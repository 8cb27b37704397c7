use std::fmt;

use analysis_core::{FundamentalMetrics, IndicatorSet, SupportResistance};

/// Proximity band around support/resistance, in percent
pub const LEVEL_BUFFER_PCT: f64 = 0.5;

/// Inputs every rule is evaluated against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    pub current_price: f64,
    pub indicators: IndicatorSet,
    pub levels: SupportResistance,
    pub fundamentals: FundamentalMetrics,
    /// `close[-1] - close[-10]`, `None` with fewer than 10 bars
    pub ten_day_change: Option<f64>,
}

/// Rules in the same group form an if/else-if chain: once one fires, the
/// rest of the group is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionGroup {
    Rsi,
    PriceLevel,
    SmaCross,
    PeRatio,
}

#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub group: Option<ExclusionGroup>,
    pub delta: i32,
    pub reason: &'static str,
    condition: fn(&ScoringContext) -> bool,
}

impl Rule {
    /// Whether the rule's condition holds, ignoring exclusion groups.
    pub fn fires(&self, ctx: &ScoringContext) -> bool {
        (self.condition)(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("delta", &self.delta)
            .field("reason", &self.reason)
            .finish()
    }
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

fn near_support(ctx: &ScoringContext) -> bool {
    ctx.current_price <= ctx.levels.support * (1.0 + LEVEL_BUFFER_PCT / 100.0)
}

fn near_resistance(ctx: &ScoringContext) -> bool {
    ctx.current_price >= ctx.levels.resistance * (1.0 - LEVEL_BUFFER_PCT / 100.0)
}

fn sma_cross(ctx: &ScoringContext) -> Option<(f64, f64)> {
    let sma_200 = ctx.indicators.sma_200?;
    let sma_50 = ctx.indicators.sma_50?;
    Some((sma_50, sma_200))
}

/// Scoring rules in evaluation order. The order fixes both precedence inside
/// exclusion groups and the order of reasons in the result.
pub static RULES: [Rule; 15] = [
    Rule {
        id: "rsi_oversold",
        group: Some(ExclusionGroup::Rsi),
        delta: 2,
        reason: "RSI < 40 (oversold)",
        condition: |ctx| below(ctx.indicators.rsi, 40.0),
    },
    Rule {
        id: "rsi_overbought",
        group: Some(ExclusionGroup::Rsi),
        delta: -2,
        reason: "RSI > 70 (overbought)",
        condition: |ctx| above(ctx.indicators.rsi, 70.0),
    },
    Rule {
        id: "near_support",
        group: Some(ExclusionGroup::PriceLevel),
        delta: 1,
        reason: "Price near support",
        condition: near_support,
    },
    Rule {
        id: "near_resistance",
        group: Some(ExclusionGroup::PriceLevel),
        delta: -1,
        reason: "Price near resistance",
        condition: near_resistance,
    },
    Rule {
        id: "between_levels",
        group: Some(ExclusionGroup::PriceLevel),
        delta: 0,
        reason: "Price between support and resistance",
        condition: |_| true,
    },
    // Independent of the level group: can fire together with near_resistance.
    Rule {
        id: "resistance_breakout",
        group: None,
        delta: 2,
        reason: "Price broke above resistance (bullish breakout)",
        condition: |ctx| ctx.current_price > ctx.levels.resistance,
    },
    Rule {
        id: "above_sma_50",
        group: None,
        delta: 1,
        reason: "Price above 50-day SMA",
        condition: |ctx| ctx.indicators.sma_50.is_some_and(|sma| ctx.current_price > sma),
    },
    Rule {
        id: "ten_day_uptrend",
        group: None,
        delta: 1,
        reason: "Uptrend in past 10 days",
        condition: |ctx| above(ctx.ten_day_change, 0.0),
    },
    Rule {
        id: "sma_uptrend",
        group: Some(ExclusionGroup::SmaCross),
        delta: 2,
        reason: "SMA 50 > 200 (Uptrend)",
        condition: |ctx| sma_cross(ctx).is_some_and(|(short, long)| short > long),
    },
    Rule {
        id: "sma_downtrend",
        group: Some(ExclusionGroup::SmaCross),
        delta: -2,
        reason: "SMA 50 < 200 (Downtrend)",
        condition: |ctx| sma_cross(ctx).is_some_and(|(short, long)| short < long),
    },
    Rule {
        id: "sma_200_missing",
        group: Some(ExclusionGroup::SmaCross),
        delta: 0,
        reason: "Not enough data for SMA 200",
        condition: |ctx| ctx.indicators.sma_200.is_none(),
    },
    Rule {
        id: "pe_below_30",
        group: Some(ExclusionGroup::PeRatio),
        delta: 1,
        reason: "P/E < 30",
        condition: |ctx| below(ctx.fundamentals.pe_ratio, 30.0),
    },
    Rule {
        id: "pe_above_50",
        group: Some(ExclusionGroup::PeRatio),
        delta: -1,
        reason: "P/E > 50",
        condition: |ctx| above(ctx.fundamentals.pe_ratio, 50.0),
    },
    Rule {
        id: "eps_above_5",
        group: None,
        delta: 1,
        reason: "EPS > 5",
        condition: |ctx| above(ctx.fundamentals.eps, 5.0),
    },
    Rule {
        id: "roe_above_20pct",
        group: None,
        delta: 1,
        reason: "ROE > 20%",
        condition: |ctx| above(ctx.fundamentals.roe, 0.2),
    },
];

/// Looks a rule up by id.
pub fn rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}
