#[cfg(test)]
mod scoring_engine_tests {
    use crate::engine::{classify_horizon, ScoringEngine};
    use crate::rules::{rule, ScoringContext, RULES};
    use analysis_core::{
        AnalysisError, FundamentalMetrics, Horizon, IndicatorSet, Recommendation,
        SupportResistance,
    };

    const LEVEL_REASONS: [&str; 3] = [
        "Price near support",
        "Price near resistance",
        "Price between support and resistance",
    ];
    const SMA_REASONS: [&str; 3] = [
        "SMA 50 > 200 (Uptrend)",
        "SMA 50 < 200 (Downtrend)",
        "Not enough data for SMA 200",
    ];

    /// price 100, support 95, resistance 110, RSI 35, SMA50 98, SMA200 90,
    /// P/E 20, EPS 6, ROE 0.25, rising over the last 10 days
    fn bullish_context() -> ScoringContext {
        ScoringContext {
            current_price: 100.0,
            indicators: IndicatorSet {
                rsi: Some(35.0),
                sma_50: Some(98.0),
                sma_200: Some(90.0),
            },
            levels: SupportResistance {
                support: 95.0,
                resistance: 110.0,
            },
            fundamentals: FundamentalMetrics {
                pe_ratio: Some(20.0),
                eps: Some(6.0),
                roe: Some(0.25),
            },
            ten_day_change: Some(1.5),
        }
    }

    /// Nothing fires except the mandatory level and SMA 200 reasons.
    fn neutral_context() -> ScoringContext {
        ScoringContext {
            current_price: 100.0,
            indicators: IndicatorSet {
                rsi: Some(55.0),
                sma_50: None,
                sma_200: None,
            },
            levels: SupportResistance {
                support: 90.0,
                resistance: 110.0,
            },
            fundamentals: FundamentalMetrics::default(),
            ten_day_change: Some(-2.0),
        }
    }

    fn count_of(reasons: &[String], group: &[&str]) -> usize {
        reasons.iter().filter(|r| group.contains(&r.as_str())).count()
    }

    #[test]
    fn test_bullish_scenario_scores_strong_buy() {
        let result = ScoringEngine::new().score(&bullish_context()).unwrap();

        assert_eq!(result.score, 9);
        assert_eq!(result.recommendation, Recommendation::StrongBuy);
        assert_eq!(result.horizon, Horizon::LongTerm);
        assert_eq!(
            result.reasons,
            vec![
                "RSI < 40 (oversold)",
                "Price between support and resistance",
                "Price above 50-day SMA",
                "Uptrend in past 10 days",
                "SMA 50 > 200 (Uptrend)",
                "P/E < 30",
                "EPS > 5",
                "ROE > 20%",
            ]
        );
    }

    #[test]
    fn test_score_is_sum_of_fired_deltas() {
        let engine = ScoringEngine::new();
        let mut contexts = vec![bullish_context(), neutral_context()];
        for price in [80.0, 95.2, 109.8, 115.0] {
            let mut ctx = bullish_context();
            ctx.current_price = price;
            contexts.push(ctx);
        }

        for ctx in contexts {
            let expected: i32 = engine.fired_rules(&ctx).iter().map(|r| r.delta).sum();
            let result = engine.score(&ctx).unwrap();
            assert_eq!(result.score, expected);
            assert_eq!(result.recommendation, Recommendation::from_score(expected));
        }
    }

    #[test]
    fn test_level_rules_are_mutually_exclusive() {
        let engine = ScoringEngine::new();
        let mut price = 85.0;
        while price < 125.0 {
            let mut ctx = bullish_context();
            ctx.current_price = price;
            let result = engine.score(&ctx).unwrap();
            assert_eq!(count_of(&result.reasons, &LEVEL_REASONS), 1, "price {}", price);
            price += 0.25;
        }
    }

    #[test]
    fn test_support_buffer_boundary() {
        let engine = ScoringEngine::new();
        let mut ctx = neutral_context();
        ctx.levels.support = 100.0;

        // Band edge is 100 * 1.005
        ctx.current_price = 100.49;
        let result = engine.score(&ctx).unwrap();
        assert!(result.reasons.contains(&"Price near support".to_string()));

        ctx.current_price = 100.51;
        let result = engine.score(&ctx).unwrap();
        assert!(result.reasons.contains(&"Price between support and resistance".to_string()));
    }

    #[test]
    fn test_near_support_wins_over_near_resistance() {
        let mut ctx = neutral_context();
        ctx.levels = SupportResistance {
            support: 100.0,
            resistance: 100.2,
        };
        ctx.current_price = 100.1;
        let result = ScoringEngine::new().score(&ctx).unwrap();

        assert_eq!(count_of(&result.reasons, &LEVEL_REASONS), 1);
        assert!(result.reasons.contains(&"Price near support".to_string()));
    }

    #[test]
    fn test_breakout_fires_with_near_resistance() {
        let mut ctx = neutral_context();
        ctx.current_price = 111.0;
        let result = ScoringEngine::new().score(&ctx).unwrap();

        assert_eq!(
            result.reasons,
            vec![
                "Price near resistance",
                "Price broke above resistance (bullish breakout)",
                "Not enough data for SMA 200",
            ]
        );
        // -1 + 2
        assert_eq!(result.score, 1);
        assert_eq!(result.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_missing_sma_200_reason_once() {
        let result = ScoringEngine::new().score(&neutral_context()).unwrap();

        assert_eq!(count_of(&result.reasons, &SMA_REASONS), 1);
        assert_eq!(
            result.reasons.iter().filter(|r| *r == "Not enough data for SMA 200").count(),
            1
        );
        assert_eq!(result.score, 0);
        assert_eq!(result.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_sma_rules_are_mutually_exclusive() {
        let engine = ScoringEngine::new();
        for (sma_50, sma_200, expected) in [
            (Some(98.0), Some(90.0), Some("SMA 50 > 200 (Uptrend)")),
            (Some(88.0), Some(90.0), Some("SMA 50 < 200 (Downtrend)")),
            (Some(90.0), None, Some("Not enough data for SMA 200")),
            (Some(90.0), Some(90.0), None),
        ] {
            let mut ctx = bullish_context();
            ctx.indicators.sma_50 = sma_50;
            ctx.indicators.sma_200 = sma_200;
            let result = engine.score(&ctx).unwrap();

            let sma_reasons: Vec<&String> = result
                .reasons
                .iter()
                .filter(|r| SMA_REASONS.contains(&r.as_str()))
                .collect();
            match expected {
                Some(reason) => assert_eq!(sma_reasons, vec![reason]),
                None => assert!(sma_reasons.is_empty()),
            }
        }
    }

    #[test]
    fn test_rsi_thresholds() {
        let engine = ScoringEngine::new();
        for (rsi, expected) in [
            (Some(39.99), Some("RSI < 40 (oversold)")),
            (Some(40.0), None),
            (Some(70.0), None),
            (Some(70.01), Some("RSI > 70 (overbought)")),
            (None, None),
        ] {
            let mut ctx = neutral_context();
            ctx.indicators.rsi = rsi;
            let result = engine.score(&ctx).unwrap();
            let rsi_reasons: Vec<&String> =
                result.reasons.iter().filter(|r| r.starts_with("RSI")).collect();
            match expected {
                Some(reason) => assert_eq!(rsi_reasons, vec![reason]),
                None => assert!(rsi_reasons.is_empty(), "rsi {:?}", rsi),
            }
        }
    }

    #[test]
    fn test_missing_fundamentals_never_score() {
        let engine = ScoringEngine::new();
        let mut ctx = bullish_context();
        ctx.fundamentals = FundamentalMetrics::default();
        let result = engine.score(&ctx).unwrap();

        assert!(!result.reasons.iter().any(|r| r.starts_with("P/E")
            || r.starts_with("EPS")
            || r.starts_with("ROE")));
        // bullish scenario minus the three fundamental points
        assert_eq!(result.score, 6);
        assert_eq!(result.horizon, Horizon::ShortTerm);
    }

    #[test]
    fn test_expensive_pe_subtracts() {
        let mut ctx = neutral_context();
        ctx.fundamentals.pe_ratio = Some(55.0);
        let result = ScoringEngine::new().score(&ctx).unwrap();

        assert!(result.reasons.contains(&"P/E > 50".to_string()));
        assert_eq!(result.score, -1);
        assert_eq!(result.recommendation, Recommendation::Sell);

        ctx.fundamentals.pe_ratio = Some(30.0);
        let result = ScoringEngine::new().score(&ctx).unwrap();
        assert!(!result.reasons.iter().any(|r| r.starts_with("P/E")));
    }

    #[test]
    fn test_recommendation_boundaries_through_engine() {
        let engine = ScoringEngine::new();

        // RSI oversold (+2) and near support (+1) plus EPS (+1) = 4
        let mut ctx = neutral_context();
        ctx.indicators.rsi = Some(30.0);
        ctx.current_price = 90.0;
        ctx.fundamentals.eps = Some(8.0);
        let result = engine.score(&ctx).unwrap();
        assert_eq!(result.score, 4);
        assert_eq!(result.recommendation, Recommendation::StrongBuy);

        ctx.fundamentals.eps = None;
        ctx.ten_day_change = Some(-1.0);
        ctx.current_price = 100.0;
        let result = engine.score(&ctx).unwrap();
        assert_eq!(result.score, 2);
        assert_eq!(result.recommendation, Recommendation::Buy);

        let result = engine.score(&neutral_context()).unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let engine = ScoringEngine::new();
        let ctx = bullish_context();

        assert_eq!(engine.score(&ctx).unwrap(), engine.score(&ctx).unwrap());
        assert_eq!(
            ScoringEngine::default().score(&ctx).unwrap(),
            engine.score(&ctx).unwrap()
        );
    }

    #[test]
    fn test_non_finite_input_is_calculation_error() {
        let mut ctx = bullish_context();
        ctx.current_price = f64::NAN;
        let err = ScoringEngine::new().score(&ctx).unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(_)));

        let mut ctx = bullish_context();
        ctx.indicators.sma_200 = Some(f64::INFINITY);
        assert!(ScoringEngine::new().score(&ctx).is_err());
    }

    #[test]
    fn test_horizon_order() {
        let bullish = bullish_context();
        assert_eq!(classify_horizon(&bullish, 9), Horizon::LongTerm);

        // Momentum: RSI under 50 with price over SMA 50
        let mut ctx = bullish;
        ctx.fundamentals.roe = Some(0.1);
        assert_eq!(classify_horizon(&ctx, 5), Horizon::ShortTerm);

        ctx.indicators.rsi = Some(60.0);
        assert_eq!(classify_horizon(&ctx, 4), Horizon::Both);
        assert_eq!(classify_horizon(&ctx, 3), Horizon::Unclear);

        ctx.indicators.rsi = None;
        assert_eq!(classify_horizon(&ctx, 0), Horizon::Unclear);
    }

    #[test]
    fn test_rules_individually() {
        let ctx = bullish_context();

        assert!(rule("rsi_oversold").unwrap().fires(&ctx));
        assert!(!rule("rsi_overbought").unwrap().fires(&ctx));
        assert!(!rule("near_support").unwrap().fires(&ctx));
        assert!(!rule("resistance_breakout").unwrap().fires(&ctx));
        assert!(rule("sma_uptrend").unwrap().fires(&ctx));
        assert!(rule("roe_above_20pct").unwrap().fires(&ctx));
        assert!(rule("no_such_rule").is_none());

        let mut flat = ctx;
        flat.ten_day_change = Some(0.0);
        assert!(!rule("ten_day_uptrend").unwrap().fires(&flat));
        flat.ten_day_change = None;
        assert!(!rule("ten_day_uptrend").unwrap().fires(&flat));
    }

    #[test]
    fn test_rule_table_order_and_ids() {
        let ids: Vec<&str> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.first(), Some(&"rsi_oversold"));
        assert_eq!(ids.last(), Some(&"roe_above_20pct"));

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), RULES.len());
    }
}
