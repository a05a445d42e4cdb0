//! Data models for the storage layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cli::types::{Phase, PlayerId, SessionId};
use crate::ledger::BidState;
use crate::valuation::{StatLine, Valuation};

/// Player record as stored in `players`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub season: Option<String>,
    pub nation: Option<String>,
    pub position: Option<String>,
    pub age: Option<f64>,
    pub squad: Option<String>,
    pub comp: Option<String>,
    pub p_score: Option<f64>,
    pub base_value: Option<f64>,
    pub elite_score: Option<f64>,
    pub market_premium: Option<f64>,
    pub final_mvpa: Option<f64>,
    pub scout_note: Option<String>,
    /// Bumped on every scouting update; guards valuation writes.
    pub revision: i64,
}

impl Player {
    pub fn valuation(&self) -> Option<Valuation> {
        Some(Valuation {
            base_value: self.base_value?,
            elite_score: self.elite_score?,
            market_premium: self.market_premium?,
            final_mvpa: self.final_mvpa?,
        })
    }

    pub(crate) fn set_valuation(&mut self, valuation: Option<Valuation>) {
        self.base_value = valuation.map(|v| v.base_value);
        self.elite_score = valuation.map(|v| v.elite_score);
        self.market_premium = valuation.map(|v| v.market_premium);
        self.final_mvpa = valuation.map(|v| v.final_mvpa);
    }
}

/// Client-supplied descriptive and scouting fields of a player.
///
/// Valuation fields are deliberately absent: they are only ever derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub nation: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub squad: Option<String>,
    #[serde(default)]
    pub comp: Option<String>,
    #[serde(default)]
    pub p_score: Option<f64>,
    #[serde(default)]
    pub scout_note: Option<String>,
    /// Raw season stat line, kept as a peer for later p-score rankings.
    #[serde(default)]
    pub stats: Option<StatLine>,
    /// `p_score` was ranked from `stats` rather than supplied.
    #[serde(default)]
    pub p_score_derived: bool,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Unsaved player view of this profile, used to run the valuation engine
    /// before anything is written.
    pub(crate) fn to_player(&self, id: PlayerId, revision: i64) -> Player {
        Player {
            id,
            name: self.name.clone(),
            season: self.season.clone(),
            nation: self.nation.clone(),
            position: self.position.clone(),
            age: self.age,
            squad: self.squad.clone(),
            comp: self.comp.clone(),
            p_score: self.p_score,
            base_value: None,
            elite_score: None,
            market_premium: None,
            final_mvpa: None,
            scout_note: self.scout_note.clone(),
            revision,
        }
    }
}

/// Stored stat line of one player, as ranked against its season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStatLine {
    pub player_id: PlayerId,
    pub name: String,
    pub season: Option<String>,
    pub position: Option<String>,
    pub stats: StatLine,
    pub p_score: Option<f64>,
    pub p_score_derived: bool,
}

/// One session's bid trajectory for one player (`user_bids`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub phase1_bid: Option<f64>,
    pub phase2_bid: Option<f64>,
    pub phase3_bid: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Bid {
    pub fn amount(&self, phase: Phase) -> Option<f64> {
        match phase {
            Phase::One => self.phase1_bid,
            Phase::Two => self.phase2_bid,
            Phase::Three => self.phase3_bid,
        }
    }

    pub fn state(&self) -> BidState {
        BidState::of(Some(self))
    }

    /// Amount of the highest submitted phase.
    pub fn final_amount(&self) -> Option<f64> {
        self.phase3_bid.or(self.phase2_bid).or(self.phase1_bid)
    }
}

/// A bid submission as received from a front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub phase: Phase,
    pub amount: f64,
    /// Seconds the participant took to decide.
    #[serde(default)]
    pub time_taken: Option<f64>,
}

impl BidRequest {
    pub fn new(session_id: SessionId, player_id: PlayerId, phase: Phase, amount: f64) -> Self {
        Self {
            session_id,
            player_id,
            phase,
            amount,
            time_taken: None,
        }
    }
}

/// Outcome of an accepted bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidReceipt {
    pub bid: Bid,
    /// `final_mvpa` the bid was bound to, if the player had one.
    pub mvpa_shown: Option<f64>,
    pub ceiling: Option<f64>,
    /// Accepted above an advisory (non-enforced) ceiling.
    pub over_ceiling: bool,
}

/// Audit row appended for every accepted phase submission (`bid_events`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEvent {
    pub id: i64,
    pub bid_id: i64,
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub phase: Phase,
    pub bid_amount: f64,
    pub time_taken: Option<f64>,
    pub mvpa_shown: Option<f64>,
    pub ceiling: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// A session's final bid for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub session_id: SessionId,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Counts from a batch recompute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub updated: usize,
    /// Players without a `p_score`.
    pub unscouted: usize,
    pub invalid: usize,
    /// Players whose scouting changed mid-recompute; retry later.
    pub conflicts: usize,
}
