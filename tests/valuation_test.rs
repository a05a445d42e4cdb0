//! Integration tests for configuration-driven valuation and scouting import

use vigiball::{
    config::AppConfig,
    scouting::{import_records, parse_records},
    storage::PlayerProfile,
    valuation::ValuationInputs,
    PlayerDatabase, ValuationEngine, VigiballError,
};

const SETTINGS: &str = r#"{
    "valuation": {
        "elite": { "competition_strength": { "A": 1.2 } },
        "competition_premium": { "A": 1.2 }
    }
}"#;

fn engine_from_settings() -> ValuationEngine {
    let config = AppConfig::from_json(SETTINGS).unwrap();
    ValuationEngine::from_config(&config.valuation).unwrap()
}

#[test]
fn test_golden_valuation_from_settings() {
    let engine = engine_from_settings();
    let inputs = ValuationInputs {
        p_score: 80.0,
        age: Some(23.0),
        squad: None,
        comp: Some("A"),
    };

    let v = engine.valuate(&inputs).unwrap();
    assert_eq!(
        (v.base_value, v.elite_score, v.market_premium, v.final_mvpa),
        (46.8, 27.95, 1.2, 89.7)
    );
}

#[test]
fn test_additive_rule_from_settings() {
    let config = AppConfig::from_json(
        r#"{"valuation": {"combine": {"rule": "additive", "elite_weight": 0.5},
                          "competition_premium": {"A": 3.0}}}"#,
    )
    .unwrap();
    let engine = ValuationEngine::from_config(&config.valuation).unwrap();

    let v = engine
        .valuate(&ValuationInputs {
            p_score: 50.0,
            age: None,
            squad: Some("Unknown FC"),
            comp: Some("A"),
        })
        .unwrap();
    // Unknown squad contributes the additive neutral 0.0
    assert_eq!(v.market_premium, 3.0);
    assert_eq!(v.final_mvpa, 30.0 + 0.5 * v.elite_score + 3.0);
}

#[test]
fn test_invalid_settings() {
    assert!(matches!(
        AppConfig::from_json(r#"{"ledger": {"ceiling_multiplier": -2}}"#),
        Err(VigiballError::Config { .. })
    ));
    assert!(matches!(
        AppConfig::from_json(r#"{"valuation": {"strategy": "magic"}}"#),
        Err(VigiballError::Json(_))
    ));
}

#[test]
fn test_stored_valuations_survive_recompute() {
    let engine = engine_from_settings();
    let mut db = PlayerDatabase::open_in_memory().unwrap();

    for (name, p) in [("Low", 20.0), ("Mid", 60.0), ("High", 95.0)] {
        let mut profile = PlayerProfile::new(name);
        profile.p_score = Some(p);
        profile.comp = Some("A".to_string());
        db.insert_player(&profile, &engine).unwrap();
    }
    let before = db.list_players().unwrap();

    let summary = db.recompute_all(&engine).unwrap();
    assert_eq!(summary.updated, 3);
    assert_eq!(db.list_players().unwrap(), before);
    assert!(db.stale_players(&engine).unwrap().is_empty());

    let values: Vec<f64> = before.iter().filter_map(|p| p.final_mvpa).collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_import_derives_p_scores_from_stats() {
    let json = r#"[
        {"name": "Sharp", "season": "2023-2024", "pos": "FW", "age": "22-010",
         "stats": {"n90s": 30, "xg": 18.0, "npg": 20, "sot_pct": "52.0%"}},
        {"name": "Blunt", "season": "2023-2024", "pos": "FW", "age": "29-200",
         "stats": {"n90s": 30, "xg": 4.0, "npg": 3, "sot_pct": "30.1%"}},
        {"name": "Middling", "season": "2023-2024", "pos": "FW,MF", "age": "26-000",
         "stats": {"n90s": 25, "xg": 9.0, "npg": 8, "sot_pct": "40%"}}
    ]"#;
    let engine = engine_from_settings();
    let mut db = PlayerDatabase::open_in_memory().unwrap();

    let summary = import_records(&mut db, &engine, parse_records(json).unwrap()).unwrap();
    assert_eq!(summary.inserted, 3);
    assert!(summary.rejected.is_empty());

    let p = |name: &str| {
        db.find_player(name, Some("2023-2024"))
            .unwrap()
            .unwrap()
            .p_score
            .unwrap()
    };
    assert!(p("Sharp") > p("Middling"));
    assert!(p("Middling") > p("Blunt"));

    let sharp = db.find_player("Sharp", Some("2023-2024")).unwrap().unwrap();
    assert!(sharp.final_mvpa.is_some());
    assert!((sharp.age.unwrap() - (22.0 + 10.0 / 365.0)).abs() < 1e-9);
}
