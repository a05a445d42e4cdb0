//! Bidding ledger rules.
//!
//! The per-(session, player) state machine and the checks a submission must
//! pass. These are pure functions over the latest committed [`Bid`]; the
//! storage layer runs them inside the write transaction so they always see
//! current state.


use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    cli::types::Phase,
    error::{Result, VigiballError},
    storage::Bid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BidState {
    NoBid,
    Phase1Submitted,
    Phase2Submitted,
    Phase3Submitted,
}

impl BidState {
    pub fn of(bid: Option<&Bid>) -> Self {
        match bid {
            None => BidState::NoBid,
            Some(b) if b.phase3_bid.is_some() => BidState::Phase3Submitted,
            Some(b) if b.phase2_bid.is_some() => BidState::Phase2Submitted,
            Some(b) if b.phase1_bid.is_some() => BidState::Phase1Submitted,
            Some(_) => BidState::NoBid,
        }
    }

    pub fn highest_phase(&self) -> Option<Phase> {
        match self {
            BidState::NoBid => None,
            BidState::Phase1Submitted => Some(Phase::One),
            BidState::Phase2Submitted => Some(Phase::Two),
            BidState::Phase3Submitted => Some(Phase::Three),
        }
    }

    /// The only phase that may be submitted next; `None` once terminal.
    pub fn next_phase(&self) -> Option<Phase> {
        match self.highest_phase() {
            None => Some(Phase::One),
            Some(phase) => phase.next(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BidState::Phase3Submitted)
    }
}

impl fmt::Display for BidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BidState::NoBid => "no bid",
            BidState::Phase1Submitted => "phase1 submitted",
            BidState::Phase2Submitted => "phase2 submitted",
            BidState::Phase3Submitted => "phase3 submitted",
        };
        write!(f, "{}", s)
    }
}

/// Result of the soft-cap check on an otherwise valid bid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CeilingCheck {
    /// No ceiling applies (no valuation, or the cap is disabled).
    Uncapped,
    Within { ceiling: f64 },
    /// Above an advisory ceiling; accepted but reported.
    Exceeded { ceiling: f64 },
}

impl CeilingCheck {
    pub fn ceiling(&self) -> Option<f64> {
        match *self {
            CeilingCheck::Uncapped => None,
            CeilingCheck::Within { ceiling } | CeilingCheck::Exceeded { ceiling } => Some(ceiling),
        }
    }

    pub fn exceeded(&self) -> bool {
        matches!(self, CeilingCheck::Exceeded { .. })
    }
}

/// Amounts are money: finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(VigiballError::invalid(
            "amount",
            format!("{amount} is not a non-negative finite amount"),
        ));
    }
    Ok(())
}

/// Check that `phase` with `amount` is a legal next step from `committed`.
///
/// Phase order is checked before the floor, so a skipped phase reports
/// `PhaseOutOfOrder` regardless of amount.
pub fn check_transition(committed: Option<&Bid>, phase: Phase, amount: f64) -> Result<()> {
    validate_amount(amount)?;

    let current = BidState::of(committed);
    if current.next_phase() != Some(phase) {
        return Err(VigiballError::PhaseOutOfOrder {
            current,
            attempted: phase,
        });
    }

    let floor = phase
        .previous()
        .and_then(|prev| committed.and_then(|bid| bid.amount(prev)));
    if let Some(floor) = floor {
        if amount < floor {
            return Err(VigiballError::BidBelowFloor {
                phase,
                amount,
                floor,
            });
        }
    }

    Ok(())
}

/// Soft cap derived from a player's valuation.
pub fn ceiling_for(final_mvpa: Option<f64>, multiplier: Option<f64>) -> Option<f64> {
    Some(final_mvpa? * multiplier?)
}

pub fn check_ceiling(amount: f64, ceiling: Option<f64>, enforce: bool) -> Result<CeilingCheck> {
    match ceiling {
        None => Ok(CeilingCheck::Uncapped),
        Some(ceiling) if amount <= ceiling => Ok(CeilingCheck::Within { ceiling }),
        Some(ceiling) if enforce => Err(VigiballError::BidAboveCeiling { amount, ceiling }),
        Some(ceiling) => Ok(CeilingCheck::Exceeded { ceiling }),
    }
}
