//! Bidding ledger persistence
//!
//! `submit_bid` is one `BEGIN IMMEDIATE` transaction: the player's current
//! `final_mvpa`, the committed bid row and the write all happen under the
//! database write lock. Concurrent submissions for the same pair are
//! therefore serialized; the later one re-reads the committed state and is
//! rejected by the phase rules, or gives up with `ConcurrencyConflict` once
//! the lock wait exceeds the configured timeout.

use super::{models::*, players::load_player, schema::PlayerDatabase};
use crate::cli::types::{Phase, PlayerId, SessionId};
use crate::config::{LedgerConfig, TimestampPolicy};
use crate::error::{Result, VigiballError};
use crate::ledger::{self, CeilingCheck};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info, warn};

const BID_COLUMNS: &str = "id, session_id, player_id, phase1_bid, phase2_bid, phase3_bid, timestamp";

fn millis_to_datetime(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn session_from_sql(idx: usize, raw: String) -> rusqlite::Result<SessionId> {
    SessionId::new(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Helper to convert a database row to a Bid
fn row_to_bid(row: &Row) -> rusqlite::Result<Bid> {
    Ok(Bid {
        id: row.get(0)?,
        session_id: session_from_sql(1, row.get(1)?)?,
        player_id: PlayerId::new(row.get(2)?),
        phase1_bid: row.get(3)?,
        phase2_bid: row.get(4)?,
        phase3_bid: row.get(5)?,
        timestamp: millis_to_datetime(6, row.get(6)?)?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<BidEvent> {
    let phase_number: u8 = row.get(4)?;
    let phase = Phase::from_number(phase_number)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, phase_number as i64))?;
    Ok(BidEvent {
        id: row.get(0)?,
        bid_id: row.get(1)?,
        session_id: session_from_sql(2, row.get(2)?)?,
        player_id: PlayerId::new(row.get(3)?),
        phase,
        bid_amount: row.get(5)?,
        time_taken: row.get(6)?,
        mvpa_shown: row.get(7)?,
        ceiling: row.get(8)?,
        timestamp: millis_to_datetime(9, row.get(9)?)?,
    })
}

fn load_bid(
    conn: &Connection,
    session_id: &SessionId,
    player_id: PlayerId,
) -> Result<Option<Bid>> {
    let bid = conn
        .query_row(
            &format!("SELECT {BID_COLUMNS} FROM user_bids WHERE session_id = ? AND player_id = ?"),
            params![session_id.as_str(), player_id.as_i64()],
            row_to_bid,
        )
        .optional()?;
    Ok(bid)
}

fn player_exists(conn: &Connection, player_id: PlayerId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM players WHERE id = ?",
            params![player_id.as_i64()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl PlayerDatabase {
    /// Submit a bid for the next phase of a session/player pair
    pub fn submit_bid(
        &mut self,
        config: &LedgerConfig,
        request: &BidRequest,
    ) -> Result<BidReceipt> {
        self.submit_bid_at(config, request, Utc::now())
    }

    /// [`submit_bid`](Self::submit_bid) with an explicit clock reading
    pub fn submit_bid_at(
        &mut self,
        config: &LedgerConfig,
        request: &BidRequest,
        now: DateTime<Utc>,
    ) -> Result<BidReceipt> {
        let result = self.apply_bid(config, request, now);
        match &result {
            Ok(receipt) if receipt.over_ceiling => warn!(
                session_id = %request.session_id,
                player_id = %request.player_id,
                phase = %request.phase,
                amount = request.amount,
                ceiling = ?receipt.ceiling,
                "bid accepted above advisory ceiling"
            ),
            Ok(_) => info!(
                session_id = %request.session_id,
                player_id = %request.player_id,
                phase = %request.phase,
                amount = request.amount,
                "bid accepted"
            ),
            Err(e) => debug!(
                session_id = %request.session_id,
                player_id = %request.player_id,
                phase = %request.phase,
                amount = request.amount,
                rule = e.rule(),
                "bid rejected: {}",
                e
            ),
        }
        result
    }

    fn apply_bid(
        &mut self,
        config: &LedgerConfig,
        request: &BidRequest,
        now: DateTime<Utc>,
    ) -> Result<BidReceipt> {
        if let Some(time_taken) = request.time_taken {
            if !time_taken.is_finite() || time_taken < 0.0 {
                return Err(VigiballError::invalid(
                    "time_taken",
                    format!("{time_taken} is not a non-negative duration"),
                ));
            }
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // The ceiling is bound to the valuation visible inside this transaction
        let player = load_player(&tx, request.player_id)?.ok_or(VigiballError::UnknownPlayer {
            player_id: request.player_id,
        })?;
        let committed = load_bid(&tx, &request.session_id, request.player_id)?;

        ledger::check_transition(committed.as_ref(), request.phase, request.amount)?;
        let ceiling = ledger::ceiling_for(player.final_mvpa, config.ceiling_multiplier);
        let check = ledger::check_ceiling(request.amount, ceiling, config.enforce_ceiling)?;

        let now_millis = now.timestamp_millis();
        let bid_id = match &committed {
            None => {
                tx.execute(
                    "INSERT INTO user_bids (session_id, player_id, phase1_bid, timestamp)
                     VALUES (?, ?, ?, ?)",
                    params![
                        request.session_id.as_str(),
                        request.player_id.as_i64(),
                        request.amount,
                        now_millis
                    ],
                )?;
                tx.last_insert_rowid()
            }
            Some(bid) => {
                let touch_timestamp = config.timestamp_policy == TimestampPolicy::OnEveryPhase;
                let column = request.phase.column();
                let rows = tx.execute(
                    &format!(
                        "UPDATE user_bids
                         SET {column} = ?, timestamp = CASE WHEN ? THEN ? ELSE timestamp END
                         WHERE id = ? AND {column} IS NULL"
                    ),
                    params![request.amount, touch_timestamp, now_millis, bid.id],
                )?;
                if rows == 0 {
                    return Err(VigiballError::ConcurrencyConflict {
                        message: format!(
                            "{} for session {} on player {} was written concurrently",
                            request.phase, request.session_id, request.player_id
                        ),
                    });
                }
                bid.id
            }
        };

        tx.execute(
            "INSERT INTO bid_events
             (bid_id, session_id, player_id, phase, bid_amount, time_taken,
              mvpa_shown, ceiling, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                bid_id,
                request.session_id.as_str(),
                request.player_id.as_i64(),
                request.phase.number(),
                request.amount,
                request.time_taken,
                player.final_mvpa,
                check.ceiling(),
                now_millis
            ],
        )?;

        let bid = load_bid(&tx, &request.session_id, request.player_id)?.ok_or_else(|| {
            VigiballError::ConcurrencyConflict {
                message: format!("bid row {bid_id} vanished during submission"),
            }
        })?;
        tx.commit()?;

        Ok(BidReceipt {
            bid,
            mvpa_shown: player.final_mvpa,
            ceiling: check.ceiling(),
            over_ceiling: matches!(check, CeilingCheck::Exceeded { .. }),
        })
    }

    /// The committed bid row of a session/player pair
    pub fn get_bid(&self, session_id: &SessionId, player_id: PlayerId) -> Result<Option<Bid>> {
        load_bid(&self.conn, session_id, player_id)
    }

    /// Amount of the highest submitted phase, or `None` if the pair has no bid
    pub fn final_bid(&self, session_id: &SessionId, player_id: PlayerId) -> Result<Option<f64>> {
        Ok(self
            .get_bid(session_id, player_id)?
            .and_then(|bid| bid.final_amount()))
    }

    /// All sessions' final bids for a player, highest first, ties to the earliest timestamp
    pub fn leaderboard(&self, player_id: PlayerId) -> Result<Vec<LeaderboardEntry>> {
        if !player_exists(&self.conn, player_id)? {
            return Err(VigiballError::UnknownPlayer { player_id });
        }

        let mut stmt = self.conn.prepare(
            "SELECT session_id, COALESCE(phase3_bid, phase2_bid, phase1_bid) AS amount, timestamp
             FROM user_bids
             WHERE player_id = ? AND phase1_bid IS NOT NULL
             ORDER BY amount DESC, timestamp ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![player_id.as_i64()], |row| {
                Ok(LeaderboardEntry {
                    session_id: session_from_sql(0, row.get(0)?)?,
                    amount: row.get(1)?,
                    timestamp: millis_to_datetime(2, row.get(2)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Every accepted submission of a session/player pair, oldest first
    pub fn bid_history(
        &self,
        session_id: &SessionId,
        player_id: PlayerId,
    ) -> Result<Vec<BidEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bid_id, session_id, player_id, phase, bid_amount, time_taken,
                    mvpa_shown, ceiling, timestamp
             FROM bid_events
             WHERE session_id = ? AND player_id = ?
             ORDER BY id",
        )?;
        let events = stmt
            .query_map(params![session_id.as_str(), player_id.as_i64()], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Every bid row of a session
    pub fn session_bids(&self, session_id: &SessionId) -> Result<Vec<Bid>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BID_COLUMNS} FROM user_bids WHERE session_id = ? ORDER BY timestamp, id"
        ))?;
        let bids = stmt
            .query_map(params![session_id.as_str()], row_to_bid)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bids)
    }
}
