//! Unit tests for the valuation engine

use super::percentile::{metric_value, percentile_of_score};
use super::*;
use crate::cli::types::PlayerId;
use crate::config::{CombineRule, StrategyKind};
use crate::storage::PlayerProfile;

fn test_config() -> ValuationConfig {
    let mut config = ValuationConfig::default();
    config.elite.competition_strength.insert("A".to_string(), 1.2);
    config.competition_premium.insert("A".to_string(), 1.2);
    config
}

fn engine() -> ValuationEngine {
    ValuationEngine::from_config(&test_config()).unwrap()
}

fn inputs(p_score: f64, age: Option<f64>, comp: Option<&str>) -> ValuationInputs<'_> {
    ValuationInputs {
        p_score,
        age,
        squad: None,
        comp,
    }
}

fn scouted(p_score: Option<f64>, age: Option<f64>) -> Player {
    let mut profile = PlayerProfile::new("Test Player");
    profile.p_score = p_score;
    profile.age = age;
    profile.comp = Some("A".to_string());
    profile.to_player(PlayerId::new(1), 0)
}

#[test]
fn test_known_valuation() {
    let valuation = engine().valuate(&inputs(80.0, Some(23.0), Some("A"))).unwrap();

    assert_eq!(valuation.base_value, 46.8);
    assert_eq!(valuation.elite_score, 27.95);
    assert_eq!(valuation.market_premium, 1.2);
    assert_eq!(valuation.final_mvpa, 89.7);
}

#[test]
fn test_final_mvpa_uses_rounded_components() {
    let engine = engine();
    for p in [61.3, 72.77, 88.01, 99.99] {
        let v = engine.valuate(&inputs(p, Some(27.4), Some("A"))).unwrap();
        let combined = round_cents((v.base_value + v.elite_score) * v.market_premium);
        assert_eq!(v.final_mvpa, combined, "p_score {p}");
    }
}

#[test]
fn test_valuate_is_deterministic() {
    let engine = engine();
    let first = engine.valuate(&inputs(73.5, Some(29.0), Some("A"))).unwrap();
    let second = engine.valuate(&inputs(73.5, Some(29.0), Some("A"))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_recompute_is_idempotent() {
    let engine = engine();
    let once = engine.recompute(&scouted(Some(80.0), Some(23.0))).unwrap();
    let twice = engine.recompute(&once).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once.final_mvpa, Some(89.7));
}

#[test]
fn test_value_increases_with_p_score() {
    let engine = engine();
    let mut previous: Option<Valuation> = None;

    for step in 0..=20 {
        let p = step as f64 * 5.0;
        let current = engine.valuate(&inputs(p, Some(26.0), Some("A"))).unwrap();
        if let Some(prev) = previous {
            assert!(current.base_value > prev.base_value, "base at p_score {p}");
            assert!(current.final_mvpa >= prev.final_mvpa, "final at p_score {p}");
        }
        previous = Some(current);
    }
}

#[test]
fn test_elite_score_is_bounded() {
    let engine = engine();
    let cap = test_config().elite.cap;

    let below = engine.valuate(&inputs(60.0, None, Some("A"))).unwrap();
    assert_eq!(below.elite_score, 0.0);

    let top = engine.valuate(&inputs(100.0, None, Some("A"))).unwrap();
    assert!(top.elite_score > 0.0);
    assert!(top.elite_score <= cap);
}

#[test]
fn test_stronger_competition_saturates_faster() {
    let engine = engine();
    let strong = engine.valuate(&inputs(75.0, None, Some("A"))).unwrap();
    let default = engine.valuate(&inputs(75.0, None, Some("Somewhere Else"))).unwrap();
    assert!(strong.elite_score > default.elite_score);
}

#[test]
fn test_unknown_context_is_neutral() {
    let engine = engine();
    let v = engine.valuate(&inputs(70.0, None, Some("Unheard League"))).unwrap();
    assert_eq!(v.market_premium, 1.0);

    let v = engine.valuate(&inputs(70.0, None, None)).unwrap();
    assert_eq!(v.market_premium, 1.0);
}

#[test]
fn test_additive_neutral_premium_is_zero() {
    let mut config = ValuationConfig::default();
    config.combine = CombineRule::Additive { elite_weight: 1.0 };
    config.competition_premium.clear();
    let engine = ValuationEngine::from_config(&config).unwrap();

    let v = engine.valuate(&inputs(50.0, None, Some("Unheard League"))).unwrap();
    assert_eq!(v.market_premium, 0.0);
    assert_eq!(v.final_mvpa, round_cents(v.base_value + v.elite_score));
}

#[test]
fn test_premium_lookup_ignores_case_and_country_code() {
    let engine = ValuationEngine::from_config(&ValuationConfig::default()).unwrap();

    for comp in ["Premier League", "premier league ", "eng Premier League"] {
        let v = engine.valuate(&inputs(50.0, None, Some(comp))).unwrap();
        assert_eq!(v.market_premium, 1.2, "{comp:?}");
    }
    // A league whose first word looks like a country code still matches directly
    let v = engine.valuate(&inputs(50.0, None, Some("La Liga"))).unwrap();
    assert_eq!(v.market_premium, 1.1);
}

#[test]
fn test_age_multiplier_bounds() {
    let engine = engine();

    let unknown = engine.valuate(&inputs(80.0, None, None)).unwrap();
    assert_eq!(unknown.base_value, 45.0);

    let prime = engine.valuate(&inputs(80.0, Some(27.0), None)).unwrap();
    assert_eq!(prime.base_value, 45.0);

    // 1 + 0.04 * 10 is capped at 1.25
    let teen = engine.valuate(&inputs(80.0, Some(14.0), None)).unwrap();
    assert_eq!(teen.base_value, 56.25);

    // 1 - 0.06 * 10 is floored at 0.5
    let veteran = engine.valuate(&inputs(80.0, Some(40.0), None)).unwrap();
    assert_eq!(veteran.base_value, 22.5);
}

#[test]
fn test_out_of_range_inputs_are_rejected() {
    let engine = engine();

    for p in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
        match engine.valuate(&inputs(p, None, None)) {
            Err(VigiballError::InvalidInput { field, .. }) => assert_eq!(field, "p_score"),
            other => panic!("Expected InvalidInput for {p}, got {other:?}"),
        }
    }

    match engine.valuate(&inputs(50.0, Some(9.0), None)) {
        Err(VigiballError::InvalidInput { field, .. }) => assert_eq!(field, "age"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_recompute_unscouted_clears_valuation() {
    let engine = engine();
    let mut player = scouted(None, Some(25.0));
    player.base_value = Some(10.0);
    player.elite_score = Some(1.0);
    player.market_premium = Some(1.0);
    player.final_mvpa = Some(11.0);

    let recomputed = engine.recompute(&player).unwrap();
    assert_eq!(recomputed.valuation(), None);
    assert_eq!(recomputed.final_mvpa, None);
    assert_eq!(recomputed.name, player.name);
}

#[test]
fn test_recompute_unscouted_still_checks_age() {
    let result = engine().recompute(&scouted(None, Some(99.0)));
    assert!(matches!(result, Err(VigiballError::InvalidInput { .. })));
}

#[test]
fn test_is_fresh() {
    let engine = engine();
    let fresh = engine.recompute(&scouted(Some(80.0), Some(23.0))).unwrap();
    assert!(engine.is_fresh(&fresh));

    let mut drifted = fresh.clone();
    drifted.final_mvpa = fresh.final_mvpa.map(|v| v + 0.005);
    assert!(engine.is_fresh(&drifted));

    drifted.final_mvpa = fresh.final_mvpa.map(|v| v + 0.5);
    assert!(!engine.is_fresh(&drifted));

    let never_valued = scouted(Some(80.0), Some(23.0));
    assert!(!engine.is_fresh(&never_valued));

    assert!(engine.is_fresh(&scouted(None, None)));
}

#[test]
fn test_age_bracket_strategy() {
    let mut config = ValuationConfig::default();
    config.strategy = StrategyKind::AgeBracket;
    let engine = ValuationEngine::from_config(&config).unwrap();
    assert_eq!(engine.strategy_name(), "age_bracket");

    let elite = |p: f64, age: Option<f64>| engine.valuate(&inputs(p, age, None)).unwrap().elite_score;

    // Prospect: (24 - age) * p * 3
    assert_eq!(elite(80.0, Some(21.0)), 72.0);
    // Prime: p * 5 * (32 - age) / 9
    assert_eq!(elite(90.0, Some(27.0)), 25.0);
    // Veteran: p * 2 / (age - 30)
    assert_eq!(elite(75.0, Some(33.0)), 5.0);
    // Below every bracket threshold
    assert_eq!(elite(50.0, Some(21.0)), 0.0);
    // Missing age falls back to the configured default of 25
    assert_eq!(elite(90.0, None), 35.0);
    // Clamped to the cap
    assert_eq!(elite(100.0, Some(14.0)), 120.0);
}

#[test]
fn test_custom_strategy() {
    struct Flat;
    impl ValuationStrategy for Flat {
        fn name(&self) -> &'static str {
            "flat"
        }
        fn base_value(&self, _: &ValuationInputs<'_>) -> f64 {
            10.0
        }
        fn elite_score(&self, _: &ValuationInputs<'_>) -> f64 {
            0.0
        }
        fn market_premium(&self, _: &ValuationInputs<'_>) -> f64 {
            1.0
        }
        fn combine(&self, base: f64, elite: f64, premium: f64) -> f64 {
            (base + elite) * premium
        }
    }

    let engine = ValuationEngine::with_strategy(&test_config(), Box::new(Flat)).unwrap();
    assert_eq!(engine.strategy_name(), "flat");
    assert_eq!(engine.valuate(&inputs(1.0, None, None)).unwrap().final_mvpa, 10.0);
    assert!(engine.valuate(&inputs(101.0, None, None)).is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = ValuationConfig::default();
    config.tolerance = -1.0;
    assert!(matches!(
        ValuationEngine::from_config(&config),
        Err(VigiballError::Config { .. })
    ));
}

mod percentile_tests {
    use super::*;

    fn line(pairs: &[(&str, f64)]) -> StatLine {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_percentile_of_score() {
        assert_eq!(percentile_of_score(&[1.0, 2.0, 3.0, 4.0], 3.0), 75.0);
        assert_eq!(percentile_of_score(&[1.0, 2.0, 3.0, 3.0], 3.0), 87.5);
        assert_eq!(percentile_of_score(&[1.0, 2.0, 3.0, 4.0], 0.5), 0.0);
        assert_eq!(percentile_of_score(&[1.0, 2.0], 9.0), 100.0);
        assert_eq!(percentile_of_score(&[], 1.0), 0.0);
    }

    #[test]
    fn test_metric_value_per_ninety() {
        let stats = line(&[("n90s", 10.0), ("kp", 20.0), ("cmp_pct", 81.5)]);
        assert_eq!(metric_value(&stats, "kp"), 2.0);
        assert_eq!(metric_value(&stats, "cmp_pct"), 81.5);
        assert_eq!(metric_value(&stats, "prgp"), 0.0);

        let no_minutes = line(&[("kp", 20.0)]);
        assert_eq!(metric_value(&no_minutes, "kp"), 0.0);
    }

    #[test]
    fn test_position_group_from_position() {
        assert_eq!(PositionGroup::from_position("GK"), PositionGroup::GK);
        assert_eq!(PositionGroup::from_position("MF,FW"), PositionGroup::FW);
        assert_eq!(PositionGroup::from_position("DF,MF"), PositionGroup::MF);
        assert_eq!(PositionGroup::from_position("df"), PositionGroup::DF);
        assert_eq!(PositionGroup::from_position(""), PositionGroup::MF);
        assert_eq!("gk".parse::<PositionGroup>().unwrap(), PositionGroup::GK);
        assert!("striker".parse::<PositionGroup>().is_err());
    }

    #[test]
    fn test_best_keeper_scores_top() {
        let keeper = |v: f64| {
            line(&[
                ("n90s", 10.0),
                ("psxg_plus_minus", v),
                ("save_pct", v),
                ("cross_stop_pct", v),
                ("launch_pct", v),
                ("opa_sweeper", v),
            ])
        };
        let best = keeper(9.0);
        let worse = keeper(1.0);
        let peers = [&best, &worse];

        let top = compute_p_score(PositionGroup::GK, &best, &peers).unwrap();
        assert_eq!(top.p_score, 100.0);
        assert_eq!(top.group, PositionGroup::GK);

        let bottom = compute_p_score(PositionGroup::GK, &worse, &peers).unwrap();
        assert_eq!(bottom.p_score, 50.0);
    }

    #[test]
    fn test_lower_is_better_metrics_are_inverted() {
        let mid = |miscontrols: f64| line(&[("n90s", 10.0), ("miscontrols", miscontrols)]);
        let lines: Vec<StatLine> = [10.0, 20.0, 30.0, 40.0].into_iter().map(mid).collect();
        let peers: Vec<&StatLine> = lines.iter().collect();

        let careful = compute_p_score(PositionGroup::MF, &lines[0], &peers).unwrap();
        assert_eq!(careful.percentiles["miscontrols"], 0.75);

        let sloppy = compute_p_score(PositionGroup::MF, &lines[3], &peers).unwrap();
        assert_eq!(sloppy.percentiles["miscontrols"], 0.0);
    }

    #[test]
    fn test_peers_need_minimum_minutes() {
        let starter = line(&[("n90s", 12.0), ("xg", 6.0)]);
        let cameo = line(&[("n90s", 2.0), ("xg", 5.0)]);

        let result = compute_p_score(PositionGroup::FW, &cameo, &[&cameo]);
        assert!(matches!(result, Err(VigiballError::InvalidInput { .. })));

        // The cameo is ranked, but only against eligible peers
        let ranked = compute_p_score(PositionGroup::FW, &cameo, &[&starter, &cameo]).unwrap();
        assert!(ranked.p_score >= 0.0 && ranked.p_score <= 100.0);
    }
}
