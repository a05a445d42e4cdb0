//! Player records and valuation persistence
//!
//! Valuation fields are a cache of the engine's output. Every scouting update
//! bumps `revision`; valuation writes are compare-and-swap on that revision,
//! so a recompute based on stale scouting data can never overwrite a newer one.

use super::{models::*, schema::PlayerDatabase};
use crate::cli::types::PlayerId;
use crate::error::{Result, VigiballError};
use crate::valuation::{StatLine, Valuation, ValuationEngine};
use rayon::prelude::*;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::time::Duration;
use tracing::{debug, info, warn};

const PLAYER_COLUMNS: &str = "id, name, season, nation, position, age, squad, comp, p_score,
     base_value, elite_score, market_premium, final_mvpa, scout_note, revision";

/// Helper to convert a database row to a Player
pub(crate) fn row_to_player(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: PlayerId::new(row.get(0)?),
        name: row.get(1)?,
        season: row.get(2)?,
        nation: row.get(3)?,
        position: row.get(4)?,
        age: row.get(5)?,
        squad: row.get(6)?,
        comp: row.get(7)?,
        p_score: row.get(8)?,
        base_value: row.get(9)?,
        elite_score: row.get(10)?,
        market_premium: row.get(11)?,
        final_mvpa: row.get(12)?,
        scout_note: row.get(13)?,
        revision: row.get(14)?,
    })
}

pub(crate) fn load_player(conn: &Connection, id: PlayerId) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?"),
            params![id.as_i64()],
            row_to_player,
        )
        .optional()?;
    Ok(player)
}

fn validate_profile(profile: &PlayerProfile) -> Result<()> {
    if profile.name.trim().is_empty() {
        return Err(VigiballError::invalid("name", "must not be empty"));
    }
    Ok(())
}

fn stats_json(profile: &PlayerProfile) -> Result<Option<String>> {
    Ok(profile
        .stats
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

fn insert_profile(
    conn: &Connection,
    profile: &PlayerProfile,
    valuation: Option<&Valuation>,
) -> Result<PlayerId> {
    conn.execute(
        "INSERT INTO players
         (name, season, nation, position, age, squad, comp, p_score,
          base_value, elite_score, market_premium, final_mvpa, scout_note,
          stats, p_score_derived, revision)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        params![
            profile.name.trim(),
            profile.season,
            profile.nation,
            profile.position,
            profile.age,
            profile.squad,
            profile.comp,
            profile.p_score,
            valuation.map(|v| v.base_value),
            valuation.map(|v| v.elite_score),
            valuation.map(|v| v.market_premium),
            valuation.map(|v| v.final_mvpa),
            profile.scout_note,
            stats_json(profile)?,
            profile.p_score_derived,
        ],
    )?;
    Ok(PlayerId::new(conn.last_insert_rowid()))
}

fn update_profile(
    conn: &Connection,
    existing: &Player,
    profile: &PlayerProfile,
    valuation: Option<&Valuation>,
) -> Result<()> {
    let rows = conn.execute(
        "UPDATE players
         SET name = ?, season = ?, nation = ?, position = ?, age = ?, squad = ?, comp = ?,
             p_score = ?, base_value = ?, elite_score = ?, market_premium = ?, final_mvpa = ?,
             scout_note = ?, stats = ?, p_score_derived = ?, revision = revision + 1
         WHERE id = ? AND revision = ?",
        params![
            profile.name.trim(),
            profile.season,
            profile.nation,
            profile.position,
            profile.age,
            profile.squad,
            profile.comp,
            profile.p_score,
            valuation.map(|v| v.base_value),
            valuation.map(|v| v.elite_score),
            valuation.map(|v| v.market_premium),
            valuation.map(|v| v.final_mvpa),
            profile.scout_note,
            stats_json(profile)?,
            profile.p_score_derived,
            existing.id.as_i64(),
            existing.revision,
        ],
    )?;
    if rows == 0 {
        return Err(VigiballError::ConcurrencyConflict {
            message: format!("player {} changed during scouting update", existing.id),
        });
    }
    Ok(())
}

/// Compare-and-swap the valuation fields of player `id` at `expected_revision`.
fn persist_valuation_in(
    conn: &Connection,
    id: PlayerId,
    expected_revision: i64,
    valuation: Option<&Valuation>,
) -> Result<()> {
    let rows = conn.execute(
        "UPDATE players
         SET base_value = ?, elite_score = ?, market_premium = ?, final_mvpa = ?
         WHERE id = ? AND revision = ?",
        params![
            valuation.map(|v| v.base_value),
            valuation.map(|v| v.elite_score),
            valuation.map(|v| v.market_premium),
            valuation.map(|v| v.final_mvpa),
            id.as_i64(),
            expected_revision,
        ],
    )?;

    if rows > 0 {
        return Ok(());
    }
    match load_player(conn, id)? {
        None => Err(VigiballError::UnknownPlayer { player_id: id }),
        Some(current) => Err(VigiballError::ConcurrencyConflict {
            message: format!(
                "player {} is at revision {}, valuation was computed for revision {}",
                id, current.revision, expected_revision
            ),
        }),
    }
}

impl PlayerDatabase {
    /// Get a player by id
    pub fn get_player(&self, id: PlayerId) -> Result<Option<Player>> {
        load_player(&self.conn, id)
    }

    /// Get a player by id, failing with `UnknownPlayer` if it does not exist
    pub fn require_player(&self, id: PlayerId) -> Result<Player> {
        self.get_player(id)?
            .ok_or(VigiballError::UnknownPlayer { player_id: id })
    }

    /// Find a player by exact name within a season (`None` matches players without a season)
    pub fn find_player(&self, name: &str, season: Option<&str>) -> Result<Option<Player>> {
        find_player_in(&self.conn, name, season)
    }

    /// Players whose name contains `fragment`, most recent season first
    pub fn search_players(&self, fragment: &str) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players
             WHERE name LIKE ?
             ORDER BY season DESC, name, id"
        ))?;
        let players = stmt
            .query_map(params![format!("%{}%", fragment.trim())], row_to_player)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    /// Get all players from the database
    pub fn list_players(&self) -> Result<Vec<Player>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id"))?;
        let players = stmt
            .query_map([], row_to_player)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    /// Create a player from scouting data, valuing it before anything is written
    pub fn insert_player(
        &mut self,
        profile: &PlayerProfile,
        engine: &ValuationEngine,
    ) -> Result<Player> {
        validate_profile(profile)?;
        let valuation = engine.recompute(&profile.to_player(PlayerId::new(0), 0))?.valuation();
        let id = insert_profile(&self.conn, profile, valuation.as_ref())?;
        info!(player_id = %id, name = %profile.name, "player created");
        self.require_player(id)
    }

    /// Replace a player's scouting data and recompute its valuation in one transaction
    pub fn update_scouting(
        &mut self,
        id: PlayerId,
        profile: &PlayerProfile,
        engine: &ValuationEngine,
    ) -> Result<Player> {
        validate_profile(profile)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing =
            load_player(&tx, id)?.ok_or(VigiballError::UnknownPlayer { player_id: id })?;
        let valuation = engine
            .recompute(&profile.to_player(id, existing.revision))?
            .valuation();
        update_profile(&tx, &existing, profile, valuation.as_ref())?;
        let updated =
            load_player(&tx, id)?.ok_or(VigiballError::UnknownPlayer { player_id: id })?;
        tx.commit()?;

        info!(player_id = %id, revision = updated.revision, "scouting updated");
        Ok(updated)
    }

    /// Update the player matching (name, season), or create it.
    ///
    /// Returns the stored player and whether it was newly inserted.
    pub fn upsert_scouting(
        &mut self,
        profile: &PlayerProfile,
        engine: &ValuationEngine,
    ) -> Result<(Player, bool)> {
        validate_profile(profile)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = find_player_in(&tx, profile.name.trim(), profile.season.as_deref())?;
        let (id, revision) = existing
            .as_ref()
            .map(|p| (p.id, p.revision))
            .unwrap_or((PlayerId::new(0), 0));
        let valuation = engine
            .recompute(&profile.to_player(id, revision))?
            .valuation();

        let (id, inserted) = match &existing {
            Some(player) => {
                update_profile(&tx, player, profile, valuation.as_ref())?;
                (player.id, false)
            }
            None => (insert_profile(&tx, profile, valuation.as_ref())?, true),
        };
        let stored =
            load_player(&tx, id)?.ok_or(VigiballError::UnknownPlayer { player_id: id })?;
        tx.commit()?;

        debug!(player_id = %id, inserted, "scouting upserted");
        Ok((stored, inserted))
    }

    /// Write a valuation computed for `expected_revision` of the player.
    ///
    /// Fails with `ConcurrencyConflict` if the scouting data changed since.
    pub fn persist_valuation(
        &mut self,
        id: PlayerId,
        expected_revision: i64,
        valuation: Option<&Valuation>,
    ) -> Result<()> {
        persist_valuation_in(&self.conn, id, expected_revision, valuation)
    }

    /// Recompute a player's valuation and persist it with compare-and-swap
    pub fn recompute_and_persist(
        &mut self,
        id: PlayerId,
        engine: &ValuationEngine,
    ) -> Result<Player> {
        let player = self.require_player(id)?;
        let updated = engine.recompute(&player)?;
        self.persist_valuation(id, player.revision, updated.valuation().as_ref())?;
        info!(
            player_id = %id,
            final_mvpa = ?updated.final_mvpa,
            strategy = engine.strategy_name(),
            "valuation persisted"
        );
        Ok(updated)
    }

    /// [`recompute_and_persist`](Self::recompute_and_persist), retrying
    /// concurrency conflicts with linear backoff
    pub fn recompute_with_retry(
        &mut self,
        id: PlayerId,
        engine: &ValuationEngine,
        max_retries: u32,
        backoff: Duration,
    ) -> Result<Player> {
        let mut attempt = 0;
        loop {
            match self.recompute_and_persist(id, engine) {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    warn!(player_id = %id, attempt, "valuation conflict, retrying: {}", e);
                    std::thread::sleep(backoff * attempt);
                }
                other => return other,
            }
        }
    }

    /// Recompute every player in parallel and persist the results.
    ///
    /// Per-player failures are counted, not fatal.
    pub fn recompute_all(&mut self, engine: &ValuationEngine) -> Result<RecomputeSummary> {
        let players = self.list_players()?;
        let results: Vec<(Player, Result<Player>)> = players
            .into_par_iter()
            .map(|player| {
                let recomputed = engine.recompute(&player);
                (player, recomputed)
            })
            .collect();

        let mut summary = RecomputeSummary::default();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (original, recomputed) in results {
            let updated = match recomputed {
                Ok(updated) => updated,
                Err(e) => {
                    warn!(player_id = %original.id, "skipping invalid player: {}", e);
                    summary.invalid += 1;
                    continue;
                }
            };
            if original.p_score.is_none() {
                summary.unscouted += 1;
                if original.valuation().is_none() {
                    continue;
                }
            }
            let valuation = updated.valuation();
            match persist_valuation_in(&tx, original.id, original.revision, valuation.as_ref()) {
                Ok(()) if original.p_score.is_some() => summary.updated += 1,
                Ok(()) => {}
                Err(e) if e.is_retryable() => {
                    warn!(player_id = %original.id, "valuation conflict: {}", e);
                    summary.conflicts += 1;
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;

        info!(
            updated = summary.updated,
            unscouted = summary.unscouted,
            invalid = summary.invalid,
            conflicts = summary.conflicts,
            "batch recompute finished"
        );
        Ok(summary)
    }

    /// Stored stat lines of every player in `season` (`None` matches players without a season)
    pub fn season_stat_lines(&self, season: Option<&str>) -> Result<Vec<SeasonStatLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, season, position, stats, p_score, p_score_derived FROM players
             WHERE season IS ? AND stats IS NOT NULL
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![season], |row| {
                Ok((
                    PlayerId::new(row.get(0)?),
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut lines = Vec::with_capacity(rows.len());
        for (player_id, name, season, position, stats, p_score, p_score_derived) in rows {
            let stats: StatLine = serde_json::from_str(&stats)?;
            lines.push(SeasonStatLine {
                player_id,
                name,
                season,
                position,
                stats,
                p_score,
                p_score_derived,
            });
        }
        Ok(lines)
    }

    /// Replace a derived p-score and revalue the player in one transaction.
    ///
    /// Returns `None` when the stored p-score already matches.
    pub fn update_derived_p_score(
        &mut self,
        id: PlayerId,
        p_score: f64,
        engine: &ValuationEngine,
    ) -> Result<Option<Player>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut player =
            load_player(&tx, id)?.ok_or(VigiballError::UnknownPlayer { player_id: id })?;
        if player.p_score == Some(p_score) {
            return Ok(None);
        }
        player.p_score = Some(p_score);
        let valuation = engine.recompute(&player)?.valuation();

        let rows = tx.execute(
            "UPDATE players
             SET p_score = ?, base_value = ?, elite_score = ?, market_premium = ?,
                 final_mvpa = ?, p_score_derived = 1, revision = revision + 1
             WHERE id = ? AND revision = ?",
            params![
                p_score,
                valuation.map(|v| v.base_value),
                valuation.map(|v| v.elite_score),
                valuation.map(|v| v.market_premium),
                valuation.map(|v| v.final_mvpa),
                id.as_i64(),
                player.revision,
            ],
        )?;
        if rows == 0 {
            return Err(VigiballError::ConcurrencyConflict {
                message: format!("player {} changed during p-score update", id),
            });
        }
        let updated =
            load_player(&tx, id)?.ok_or(VigiballError::UnknownPlayer { player_id: id })?;
        tx.commit()?;

        debug!(player_id = %id, p_score, "derived p_score updated");
        Ok(Some(updated))
    }

    /// Players whose cached valuation drifted beyond the engine's tolerance
    pub fn stale_players(&self, engine: &ValuationEngine) -> Result<Vec<Player>> {
        Ok(self
            .list_players()?
            .into_iter()
            .filter(|p| !engine.is_fresh(p))
            .collect())
    }
}

fn find_player_in(conn: &Connection, name: &str, season: Option<&str>) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            &format!(
                "SELECT {PLAYER_COLUMNS} FROM players
                 WHERE name = ? AND season IS ?
                 ORDER BY id LIMIT 1"
            ),
            params![name, season],
            row_to_player,
        )
        .optional()?;
    Ok(player)
}
