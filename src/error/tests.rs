//! Unit tests for error handling

use super::*;
use rusqlite::ffi;
use std::io;

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let error = VigiballError::from(json_error);

    match error {
        VigiballError::Json(_) => (),
        _ => panic!("Expected Json error variant"),
    }
}

#[test]
fn test_io_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
    let error = VigiballError::from(io_error);

    match error {
        VigiballError::Io(_) => (),
        _ => panic!("Expected Io error variant"),
    }
}

#[test]
fn test_busy_database_is_a_conflict() {
    for code in [ffi::SQLITE_BUSY, ffi::SQLITE_LOCKED] {
        let sqlite_error = rusqlite::Error::SqliteFailure(ffi::Error::new(code), None);
        let error = VigiballError::from(sqlite_error);

        assert!(
            matches!(error, VigiballError::ConcurrencyConflict { .. }),
            "code {code} gave {error:?}"
        );
        assert!(error.is_retryable());
    }
}

#[test]
fn test_other_database_errors_are_not_retryable() {
    let error = VigiballError::from(rusqlite::Error::QueryReturnedNoRows);

    match &error {
        VigiballError::Database(_) => (),
        _ => panic!("Expected Database error variant"),
    }
    assert!(!error.is_retryable());

    let constraint = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_CONSTRAINT), None);
    assert!(matches!(
        VigiballError::from(constraint),
        VigiballError::Database(_)
    ));
}

#[test]
fn test_rule_names() {
    let out_of_order = VigiballError::PhaseOutOfOrder {
        current: BidState::NoBid,
        attempted: Phase::Two,
    };
    assert_eq!(out_of_order.rule(), Some("phase_order"));

    let below = VigiballError::BidBelowFloor {
        phase: Phase::Two,
        amount: 90.0,
        floor: 100.0,
    };
    assert_eq!(below.rule(), Some("bid_floor"));

    let above = VigiballError::BidAboveCeiling {
        amount: 200.0,
        ceiling: 150.0,
    };
    assert_eq!(above.rule(), Some("bid_ceiling"));

    assert_eq!(VigiballError::invalid("amount", "negative").rule(), None);
    assert_eq!(
        VigiballError::UnknownPlayer {
            player_id: PlayerId::new(7)
        }
        .rule(),
        None
    );
}

#[test]
fn test_error_display() {
    let error = VigiballError::invalid("p_score", "150 is outside 0..=100");
    assert_eq!(error.to_string(), "Invalid p_score: 150 is outside 0..=100");

    let error = VigiballError::UnknownPlayer {
        player_id: PlayerId::new(42),
    };
    assert_eq!(error.to_string(), "Unknown player: 42");

    let error = VigiballError::PhaseOutOfOrder {
        current: BidState::NoBid,
        attempted: Phase::Two,
    };
    assert_eq!(
        error.to_string(),
        "Phase out of order: cannot submit phase2 when state is no bid"
    );

    let error = VigiballError::BidBelowFloor {
        phase: Phase::Two,
        amount: 90.0,
        floor: 100.0,
    };
    assert_eq!(
        error.to_string(),
        "Bid below floor: phase2 bid of 90 is below the committed 100"
    );

    let error = VigiballError::Config {
        message: "bad value".to_string(),
    };
    assert_eq!(error.to_string(), "Configuration error: bad value");
}
