//! Scouting intake: raw import records to stored, valued players.
//!
//! Records come as a JSON array. Each one carries either a ready `p_score`
//! or a raw stat line from which the p-score is derived. The peers are every
//! stored or incoming player of the same season whose position lists the
//! group, so a `"MF,FW"` forward also counts as a midfield peer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{
    error::{Result, VigiballError},
    cli::types::PlayerId,
    storage::{PlayerDatabase, PlayerProfile, SeasonStatLine},
    valuation::{
        compute_p_score, percentile::NINETIES_KEY, round_cents, PositionGroup, StatLine,
        ValuationEngine,
    },
};


/// A number, or text such as `"25-082"` or `"45.2%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// One player as delivered by a scouting feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoutingRecord {
    pub name: String,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub nation: Option<String>,
    #[serde(default, alias = "pos")]
    pub position: Option<String>,
    #[serde(default)]
    pub squad: Option<String>,
    #[serde(default)]
    pub comp: Option<String>,
    #[serde(default)]
    pub age: Option<RawValue>,
    #[serde(default)]
    pub p_score: Option<f64>,
    #[serde(default)]
    pub scout_note: Option<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Stored players whose derived p-score moved with the new peers.
    pub reranked: usize,
    /// `(name, reason)` of every record that was not stored.
    pub rejected: Vec<(String, String)>,
}

/// Convert an age given as `"years-days"` to fractional years.
///
/// Plain numbers pass through; blank text is `None`.
pub fn parse_age(raw: &RawValue) -> Result<Option<f64>> {
    let text = match raw {
        RawValue::Number(n) => return Ok(Some(*n)),
        RawValue::Text(t) => t.trim(),
    };
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || VigiballError::invalid("age", format!("cannot parse {text:?}"));
    match text.split_once('-') {
        Some((years, days)) => {
            let years: f64 = years.trim().parse().map_err(|_| invalid())?;
            let days: f64 = days.trim().parse().map_err(|_| invalid())?;
            Ok(Some(years + days / 365.0))
        }
        None => text.parse().map(Some).map_err(|_| invalid()),
    }
}

/// Strip a trailing percent sign; blank text is `None`.
pub fn parse_percentage(raw: &RawValue) -> Result<Option<f64>> {
    let text = match raw {
        RawValue::Number(n) => return Ok(Some(*n)),
        RawValue::Text(t) => t.trim(),
    };
    if text.is_empty() {
        return Ok(None);
    }
    text.trim_end_matches('%')
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| VigiballError::invalid("stat", format!("cannot parse {text:?}")))
}

/// Numeric stat line of a record; unparseable or blank values are dropped.
///
/// Keys are lowercased, and the feed's `90s` column is read as `n90s`.
pub fn stat_line(record: &ScoutingRecord) -> StatLine {
    record
        .stats
        .iter()
        .filter_map(|(key, raw)| {
            let key = match key.to_lowercase() {
                k if k == "90s" => NINETIES_KEY.to_string(),
                k => k,
            };
            parse_percentage(raw).ok().flatten().map(|value| (key, value))
        })
        .collect()
}

/// Whether a position string such as `"MF,FW"` lists `group`.
///
/// Hybrid players are peers of every group they list.
pub fn plays_in(position: Option<&str>, group: PositionGroup) -> bool {
    position
        .unwrap_or("")
        .to_uppercase()
        .contains(&group.to_string())
}

/// One candidate of a season's peer pool
struct Peer<'a> {
    season: Option<&'a str>,
    position: Option<&'a str>,
    stats: &'a StatLine,
}

/// Rank `stats` against every peer of the same season that plays in `group`.
fn rank(
    name: &str,
    season: Option<&str>,
    group: PositionGroup,
    stats: &StatLine,
    pool: &[Peer<'_>],
) -> Option<f64> {
    let peers: Vec<&StatLine> = pool
        .iter()
        .filter(|p| p.season == season && plays_in(p.position, group))
        .map(|p| p.stats)
        .collect();
    match compute_p_score(group, stats, &peers) {
        Ok(breakdown) => Some(round_cents(breakdown.p_score)),
        Err(e) => {
            warn!(name = %name, "cannot derive p_score: {}", e);
            None
        }
    }
}

fn group_of(position: Option<&str>) -> PositionGroup {
    PositionGroup::from_position(position.unwrap_or(""))
}

/// Fill in missing p-scores from stat lines.
///
/// Each record is ranked against its season: the incoming records plus the
/// `stored` lines they do not replace. Records that already have a p-score,
/// or have no stats, are left alone.
pub fn derive_p_scores(records: &mut [ScoutingRecord], stored: &[SeasonStatLine]) {
    let lines: Vec<StatLine> = records.iter().map(stat_line).collect();

    let mut pool: Vec<Peer<'_>> = records
        .iter()
        .zip(&lines)
        .filter(|(_, line)| !line.is_empty())
        .map(|(r, line)| Peer {
            season: r.season.as_deref(),
            position: r.position.as_deref(),
            stats: line,
        })
        .collect();
    pool.extend(
        stored
            .iter()
            .filter(|line| !replaced_by_batch(line, records))
            .map(|line| Peer {
                season: line.season.as_deref(),
                position: line.position.as_deref(),
                stats: &line.stats,
            }),
    );

    let derived: Vec<Option<f64>> = records
        .iter()
        .zip(&lines)
        .map(|(record, line)| {
            if record.p_score.is_some() || line.is_empty() {
                return None;
            }
            let position = record.position.as_deref();
            rank(
                &record.name,
                record.season.as_deref(),
                group_of(position),
                line,
                &pool,
            )
        })
        .collect();

    for (record, p_score) in records.iter_mut().zip(derived) {
        if p_score.is_some() {
            record.p_score = p_score;
        }
    }
}

fn replaced_by_batch(line: &SeasonStatLine, records: &[ScoutingRecord]) -> bool {
    records
        .iter()
        .any(|r| r.name.trim() == line.name && r.season == line.season)
}

fn to_profile(record: &ScoutingRecord) -> Result<PlayerProfile> {
    let age = record.age.as_ref().map(parse_age).transpose()?.flatten();
    let stats = Some(stat_line(record)).filter(|line| !line.is_empty());
    Ok(PlayerProfile {
        name: record.name.trim().to_string(),
        season: record.season.clone(),
        nation: record.nation.clone(),
        position: record.position.clone(),
        age,
        squad: record.squad.clone(),
        comp: record.comp.clone(),
        p_score: record.p_score,
        scout_note: record.scout_note.clone(),
        stats,
        p_score_derived: false,
    })
}

/// Distinct seasons of a batch, in first-seen order.
fn seasons_of(records: &[ScoutingRecord]) -> Vec<Option<String>> {
    let mut seasons: Vec<Option<String>> = Vec::new();
    for record in records {
        if !seasons.contains(&record.season) {
            seasons.push(record.season.clone());
        }
    }
    seasons
}

/// Re-rank stored players of `season` whose p-score was derived (or could not
/// be derived yet), so earlier imports see the peers added since. Returns how
/// many changed.
fn rerank_season(
    db: &mut PlayerDatabase,
    engine: &ValuationEngine,
    season: Option<&str>,
    skip: &[PlayerId],
) -> Result<usize> {
    let lines = db.season_stat_lines(season)?;
    let pool: Vec<Peer<'_>> = lines
        .iter()
        .map(|line| Peer {
            season,
            position: line.position.as_deref(),
            stats: &line.stats,
        })
        .collect();

    let updates: Vec<(PlayerId, f64)> = lines
        .iter()
        .filter(|line| line.p_score_derived || line.p_score.is_none())
        .filter(|line| !skip.contains(&line.player_id))
        .filter_map(|line| {
            let position = line.position.as_deref();
            rank(&line.name, season, group_of(position), &line.stats, &pool)
                .map(|p| (line.player_id, p))
        })
        .collect();

    let mut changed = 0;
    for (id, p_score) in updates {
        match db.update_derived_p_score(id, p_score, engine) {
            Ok(Some(_)) => changed += 1,
            Ok(None) => {}
            Err(e @ VigiballError::InvalidInput { .. }) => {
                warn!(player_id = %id, "cannot re-rank player: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(changed)
}

/// Store a batch of scouting records, valuing each one.
///
/// Players are matched on (name, season) and updated in place, so existing
/// bids keep pointing at the same player. A record that fails validation is
/// reported in the summary and leaves nothing behind. Derived p-scores rank
/// against the whole stored season, and stored players of the touched
/// seasons are re-ranked once the batch is in.
pub fn import_records(
    db: &mut PlayerDatabase,
    engine: &ValuationEngine,
    mut records: Vec<ScoutingRecord>,
) -> Result<ImportSummary> {
    let seasons = seasons_of(&records);
    let mut stored = Vec::new();
    for season in &seasons {
        stored.extend(db.season_stat_lines(season.as_deref())?);
    }
    let supplied: Vec<bool> = records.iter().map(|r| r.p_score.is_some()).collect();
    derive_p_scores(&mut records, &stored);

    let mut summary = ImportSummary::default();
    let mut touched = Vec::new();
    for (record, supplied) in records.iter().zip(supplied) {
        let outcome = to_profile(record).and_then(|mut profile| {
            profile.p_score_derived = record.p_score.is_some() && !supplied;
            db.upsert_scouting(&profile, engine)
        });
        match outcome {
            Ok((player, inserted)) => {
                touched.push(player.id);
                if inserted {
                    summary.inserted += 1;
                } else {
                    summary.updated += 1;
                }
            }
            Err(e @ VigiballError::InvalidInput { .. }) => {
                warn!(name = %record.name, "rejected scouting record: {}", e);
                summary.rejected.push((record.name.clone(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    for season in &seasons {
        summary.reranked += rerank_season(db, engine, season.as_deref(), &touched)?;
    }

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        reranked = summary.reranked,
        rejected = summary.rejected.len(),
        "scouting import finished"
    );
    Ok(summary)
}

/// Parse a JSON array of scouting records.
pub fn parse_records(json: &str) -> Result<Vec<ScoutingRecord>> {
    Ok(serde_json::from_str(json)?)
}
