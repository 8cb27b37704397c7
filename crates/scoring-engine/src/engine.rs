use std::collections::HashSet;

use analysis_core::{AnalysisError, Horizon, Recommendation, ScoreResult};

use crate::rules::{Rule, ScoringContext, RULES};

/// Additive rule engine turning a [`ScoringContext`] into a [`ScoreResult`].
pub struct ScoringEngine {
    rules: &'static [Rule],
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self { rules: &RULES }
    }

    /// Rules that fire for `ctx`, in evaluation order, honouring exclusion
    /// groups.
    pub fn fired_rules(&self, ctx: &ScoringContext) -> Vec<&'static Rule> {
        let mut fired = Vec::new();
        let mut closed_groups = HashSet::new();

        for rule in self.rules {
            if let Some(group) = rule.group {
                if closed_groups.contains(&group) {
                    continue;
                }
            }
            if rule.fires(ctx) {
                tracing::debug!("Rule {} fired ({:+})", rule.id, rule.delta);
                if let Some(group) = rule.group {
                    closed_groups.insert(group);
                }
                fired.push(rule);
            }
        }

        fired
    }

    pub fn score(&self, ctx: &ScoringContext) -> Result<ScoreResult, AnalysisError> {
        check_finite(ctx)?;

        let fired = self.fired_rules(ctx);
        let score: i32 = fired.iter().map(|r| r.delta).sum();
        let reasons = fired.iter().map(|r| r.reason.to_string()).collect();

        Ok(ScoreResult {
            score,
            recommendation: Recommendation::from_score(score),
            reasons,
            horizon: classify_horizon(ctx, score),
        })
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Holding-period category; the first matching condition wins.
pub fn classify_horizon(ctx: &ScoringContext, score: i32) -> Horizon {
    let f = &ctx.fundamentals;
    let strong_fundamentals = f.pe_ratio.is_some_and(|pe| pe < 30.0)
        && f.roe.is_some_and(|roe| roe > 0.2)
        && f.eps.is_some_and(|eps| eps > 5.0);
    let momentum = ctx.indicators.rsi.is_some_and(|rsi| rsi < 50.0)
        && ctx.indicators.sma_50.is_some_and(|sma| ctx.current_price > sma);

    if strong_fundamentals {
        Horizon::LongTerm
    } else if momentum {
        Horizon::ShortTerm
    } else if score >= 4 {
        Horizon::Both
    } else {
        Horizon::Unclear
    }
}

fn check_finite(ctx: &ScoringContext) -> Result<(), AnalysisError> {
    let required = [
        ("current price", Some(ctx.current_price)),
        ("support", Some(ctx.levels.support)),
        ("resistance", Some(ctx.levels.resistance)),
        ("RSI", ctx.indicators.rsi),
        ("SMA 50", ctx.indicators.sma_50),
        ("SMA 200", ctx.indicators.sma_200),
        ("10-day change", ctx.ten_day_change),
        ("P/E ratio", ctx.fundamentals.pe_ratio),
        ("EPS", ctx.fundamentals.eps),
        ("ROE", ctx.fundamentals.roe),
    ];

    for (name, value) in required {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(AnalysisError::CalculationError(format!(
                    "{} is not a finite number ({})",
                    name, v
                )));
            }
        }
    }
    Ok(())
}
