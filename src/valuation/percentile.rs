//! P-score derivation from raw per-season stat lines.
//!
//! A player is ranked against peers in the same position group on that
//! group's metric profile. Volume stats are compared per 90 minutes, rate
//! stats as-is. The p-score is the mean percentile scaled to 0..=100.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::{Result, VigiballError};

/// Raw stats keyed by metric name; `n90s` holds the number of full 90s played.
pub type StatLine = BTreeMap<String, f64>;

/// Peers need at least this many 90s to count.
pub const MIN_PEER_NINETIES: f64 = 5.0;

pub const NINETIES_KEY: &str = "n90s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    FW,
    MF,
    DF,
    GK,
}

impl PositionGroup {
    /// Bucket a free-form position string such as `"DF,MF"`.
    ///
    /// Goalkeeper wins over forward, forward over midfield, midfield over
    /// defence. Unrecognized strings fall back to midfield.
    pub fn from_position(position: &str) -> Self {
        let upper = position.to_uppercase();
        if upper.contains("GK") {
            PositionGroup::GK
        } else if upper.contains("FW") {
            PositionGroup::FW
        } else if upper.contains("MF") {
            PositionGroup::MF
        } else if upper.contains("DF") {
            PositionGroup::DF
        } else {
            PositionGroup::MF
        }
    }

    /// Metric profile as `(name, higher_is_better)`.
    pub fn profile(&self) -> &'static [(&'static str, bool)] {
        match self {
            PositionGroup::FW => &[
                ("xg", true),
                ("npg", true),
                ("xag", true),
                ("gca90", true),
                ("prgc", true),
                ("succ_pct", true),
                ("sot_pct", true),
                ("touches_box", true),
            ],
            PositionGroup::MF => &[
                ("xag", true),
                ("kp", true),
                ("cmp_pct", true),
                ("prgp", true),
                ("tkl_pct", true),
                ("interceptions", true),
                ("miscontrols", false),
                ("dispossessed", false),
            ],
            PositionGroup::DF => &[
                ("aerial_won_pct", true),
                ("def_act_att_3rd", true),
                ("recoveries", true),
                ("prg_pass_dist", true),
                ("blocks", true),
                ("tkl_int", true),
                ("clearances", true),
            ],
            PositionGroup::GK => &[
                ("psxg_plus_minus", true),
                ("save_pct", true),
                ("cross_stop_pct", true),
                ("launch_pct", true),
                ("opa_sweeper", true),
            ],
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionGroup::FW => "FW",
            PositionGroup::MF => "MF",
            PositionGroup::DF => "DF",
            PositionGroup::GK => "GK",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PositionGroup {
    type Err = VigiballError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "FW" => Ok(PositionGroup::FW),
            "MF" => Ok(PositionGroup::MF),
            "DF" => Ok(PositionGroup::DF),
            "GK" => Ok(PositionGroup::GK),
            _ => Err(VigiballError::invalid(
                "position",
                format!("unrecognized position group: {s:?}"),
            )),
        }
    }
}

/// Rate stats are already normalized and are not divided by 90s.
pub fn is_rate_stat(metric: &str) -> bool {
    metric.contains("pct") || metric == "gca90"
}

/// Value of `metric` as compared between players; missing values count as 0.
pub fn metric_value(stats: &StatLine, metric: &str) -> f64 {
    let raw = stats.get(metric).copied().filter(|v| v.is_finite());
    if is_rate_stat(metric) {
        return raw.unwrap_or(0.0);
    }
    match (raw, stats.get(NINETIES_KEY).copied()) {
        (Some(v), Some(n90s)) if n90s > 0.0 => v / n90s,
        _ => 0.0,
    }
}

/// Percentile rank of `score` within `values`, in 0..=100.
///
/// Ties are averaged: with `left` values strictly below and `right` values at
/// or below the score, the rank is `(left + right + [right > left]) * 50 / n`.
pub fn percentile_of_score(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let left = values.iter().filter(|v| **v < score).count();
    let right = values.iter().filter(|v| **v <= score).count();
    let plus_one = usize::from(right > left);
    (left + right + plus_one) as f64 * 50.0 / values.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PScoreBreakdown {
    pub group: PositionGroup,
    pub p_score: f64,
    /// Per-metric percentile as a 0..=1 fraction, already inverted where
    /// lower is better.
    pub percentiles: BTreeMap<String, f64>,
}

/// Rank `player` against the eligible `peers` of `group`.
///
/// Peers below [`MIN_PEER_NINETIES`] are ignored; an empty peer group is an
/// error since no ranking is possible.
pub fn compute_p_score(
    group: PositionGroup,
    player: &StatLine,
    peers: &[&StatLine],
) -> Result<PScoreBreakdown> {
    let eligible: Vec<&StatLine> = peers
        .iter()
        .copied()
        .filter(|p| p.get(NINETIES_KEY).copied().unwrap_or(0.0) >= MIN_PEER_NINETIES)
        .collect();

    if eligible.is_empty() {
        return Err(VigiballError::invalid(
            "peers",
            format!("no {group} peers with at least {MIN_PEER_NINETIES} 90s"),
        ));
    }

    let mut percentiles = BTreeMap::new();
    for (metric, higher_is_better) in group.profile() {
        let peer_values: Vec<f64> = eligible.iter().map(|p| metric_value(p, metric)).collect();
        let pct = percentile_of_score(&peer_values, metric_value(player, metric)) / 100.0;
        let pct = if *higher_is_better { pct } else { 1.0 - pct };
        percentiles.insert(metric.to_string(), pct);
    }

    let mean = percentiles.values().sum::<f64>() / percentiles.len() as f64;

    Ok(PScoreBreakdown {
        group,
        p_score: mean * 100.0,
        percentiles,
    })
}
