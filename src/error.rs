//! Error types for the player valuation and bidding core

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::cli::types::{Phase, PlayerId};
use crate::ledger::BidState;

pub type Result<T> = std::result::Result<T, VigiballError>;

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum VigiballError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown player: {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Phase out of order: cannot submit {attempted} when state is {current}")]
    PhaseOutOfOrder { current: BidState, attempted: Phase },

    #[error("Bid below floor: {phase} bid of {amount} is below the committed {floor}")]
    BidBelowFloor { phase: Phase, amount: f64, floor: f64 },

    #[error("Bid above ceiling: {amount} exceeds the ceiling of {ceiling}")]
    BidAboveCeiling { amount: f64, ceiling: f64 },

    #[error("Concurrency conflict: {message}")]
    ConcurrencyConflict { message: String },

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl VigiballError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        VigiballError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Lock or transaction contention; the caller should retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VigiballError::ConcurrencyConflict { .. })
    }

    /// Name of the business rule a rejected bid violated.
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            VigiballError::PhaseOutOfOrder { .. } => Some("phase_order"),
            VigiballError::BidBelowFloor { .. } => Some("bid_floor"),
            VigiballError::BidAboveCeiling { .. } => Some("bid_ceiling"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for VigiballError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                VigiballError::ConcurrencyConflict {
                    message: err.to_string(),
                }
            }
            _ => VigiballError::Database(err),
        }
    }
}
