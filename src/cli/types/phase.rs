//! Auction phase type.

use crate::error::VigiballError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three sequential bidding rounds.
///
/// Bids for a session/player pair must be submitted in phase order.
///
/// # Examples
///
/// ```rust
/// use vigiball::Phase;
///
/// let phase: Phase = "phase2".parse().unwrap();
/// assert_eq!(phase, Phase::Two);
/// assert_eq!(phase.previous(), Some(Phase::One));
/// assert_eq!(phase.to_string(), "phase2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "phase1")]
    One,
    #[serde(rename = "phase2")]
    Two,
    #[serde(rename = "phase3")]
    Three,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::One, Phase::Two, Phase::Three];

    pub fn number(&self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
            Phase::Three => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Phase::One),
            2 => Some(Phase::Two),
            3 => Some(Phase::Three),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Column in `user_bids` holding this phase's amount.
    pub fn column(&self) -> &'static str {
        match self {
            Phase::One => "phase1_bid",
            Phase::Two => "phase2_bid",
            Phase::Three => "phase3_bid",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase{}", self.number())
    }
}

impl FromStr for Phase {
    type Err = VigiballError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let digits = lowered
            .strip_prefix("phase")
            .or_else(|| lowered.strip_prefix('p'))
            .unwrap_or(&lowered)
            .trim();
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| VigiballError::invalid("phase", format!("unrecognized phase: {s:?}")))
    }
}
