//! Configuration for the valuation engine and the bidding ledger.
//!
//! Settings live in a single JSON document. Every field has a default, so a
//! missing file (or a partial one) is always usable:
//!
//! ```json
//! {
//!   "valuation": { "strategy": "curve", "combine": { "rule": "multiplicative", "elite_weight": 1.0 } },
//!   "ledger": { "ceiling_multiplier": 1.5, "enforce_ceiling": true, "timestamp_policy": "on_create" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{Result, VigiballError};


pub const CONFIG_ENV_VAR: &str = "VIGIBALL_CONFIG";
pub const DB_ENV_VAR: &str = "VIGIBALL_DB";

/// Path: ~/.config/vigiball/config.json
pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.push(".config");
        home
    });
    base.join("vigiball").join("config.json")
}

/// Path: ~/.local/share/vigiball/vigiball.db
pub fn default_database_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| {
        let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.push(".local");
        home.push("share");
        home
    });
    base.join("vigiball").join("vigiball.db")
}

/// Top-level application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub valuation: ValuationConfig,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Resolve the config path (explicit, then `VIGIBALL_CONFIG`, then the default
    /// location) and load it. A missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_config_path),
        };
        Self::load_from(&path)
    }

    /// Load from a specific file, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| match e {
            VigiballError::Json(err) => VigiballError::Config {
                message: format!("{}: {}", path.display(), err),
            },
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.valuation.validate()?;
        self.ledger.validate()
    }
}

fn config_error(message: impl Into<String>) -> VigiballError {
    VigiballError::Config {
        message: message.into(),
    }
}

/// Inclusive numeric range used to validate scouting inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Which scoring strategy the valuation engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Saturating competition-weighted elite curve.
    #[default]
    Curve,
    /// Prospect / prime / veteran elite brackets.
    AgeBracket,
}

/// How `base_value`, `elite_score` and `market_premium` become `final_mvpa`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CombineRule {
    /// `(base + elite_weight * elite) * premium`; neutral premium is 1.0
    Multiplicative { elite_weight: f64 },
    /// `base + elite_weight * elite + premium`; neutral premium is 0.0
    Additive { elite_weight: f64 },
}

impl CombineRule {
    pub fn neutral_premium(&self) -> f64 {
        match self {
            CombineRule::Multiplicative { .. } => 1.0,
            CombineRule::Additive { .. } => 0.0,
        }
    }

    pub fn combine(&self, base_value: f64, elite_score: f64, market_premium: f64) -> f64 {
        match *self {
            CombineRule::Multiplicative { elite_weight } => {
                (base_value + elite_weight * elite_score) * market_premium
            }
            CombineRule::Additive { elite_weight } => {
                base_value + elite_weight * elite_score + market_premium
            }
        }
    }

    fn elite_weight(&self) -> f64 {
        match *self {
            CombineRule::Multiplicative { elite_weight } | CombineRule::Additive { elite_weight } => {
                elite_weight
            }
        }
    }
}

impl Default for CombineRule {
    fn default() -> Self {
        CombineRule::Multiplicative { elite_weight: 1.0 }
    }
}

/// Base value curve: `(floor + value_per_point * p_score) * age_multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseCurveConfig {
    pub value_per_point: f64,
    pub floor: f64,
    /// Players younger than this get a premium.
    pub young_age: f64,
    pub young_premium_per_year: f64,
    pub max_multiplier: f64,
    /// Players older than this get a discount.
    pub veteran_age: f64,
    pub veteran_discount_per_year: f64,
    pub min_multiplier: f64,
}

impl Default for BaseCurveConfig {
    fn default() -> Self {
        Self {
            value_per_point: 0.5,
            floor: 5.0,
            young_age: 24.0,
            young_premium_per_year: 0.04,
            max_multiplier: 1.25,
            veteran_age: 30.0,
            veteran_discount_per_year: 0.06,
            min_multiplier: 0.5,
        }
    }
}

/// Elite curve: `cap * (1 - exp(-rate * strength * max(0, p_score - threshold)))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    pub threshold: f64,
    pub cap: f64,
    pub rate: f64,
    /// Strength used for competitions missing from `competition_strength`.
    pub default_strength: f64,
    pub competition_strength: BTreeMap<String, f64>,
}

impl Default for EliteConfig {
    fn default() -> Self {
        let competition_strength = [
            ("premier league", 1.3),
            ("la liga", 1.25),
            ("bundesliga", 1.2),
            ("serie a", 1.2),
            ("ligue 1", 1.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            threshold: 60.0,
            cap: 40.0,
            rate: 0.05,
            default_strength: 1.0,
            competition_strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeBracketConfig {
    pub cap: f64,
    /// Age assumed when none is recorded.
    pub default_age: f64,
}

impl Default for AgeBracketConfig {
    fn default() -> Self {
        Self {
            cap: 120.0,
            default_age: 25.0,
        }
    }
}

/// Valuation engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub strategy: StrategyKind,
    pub combine: CombineRule,
    pub p_score_range: InputRange,
    pub age_range: InputRange,
    pub base: BaseCurveConfig,
    pub elite: EliteConfig,
    pub age_bracket: AgeBracketConfig,
    /// Premium per squad; factors when multiplicative, amounts when additive.
    pub squad_premium: BTreeMap<String, f64>,
    /// Premium per competition; factors when multiplicative, amounts when additive.
    pub competition_premium: BTreeMap<String, f64>,
    /// Maximum allowed drift between a cached `final_mvpa` and a fresh recompute.
    pub tolerance: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        let competition_premium = [
            ("premier league", 1.2),
            ("la liga", 1.1),
            ("bundesliga", 1.05),
            ("serie a", 1.05),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            strategy: StrategyKind::default(),
            combine: CombineRule::default(),
            p_score_range: InputRange::new(0.0, 100.0),
            age_range: InputRange::new(14.0, 50.0),
            base: BaseCurveConfig::default(),
            elite: EliteConfig::default(),
            age_bracket: AgeBracketConfig::default(),
            squad_premium: BTreeMap::new(),
            competition_premium,
            tolerance: 0.01,
        }
    }
}

impl ValuationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [("p_score_range", self.p_score_range), ("age_range", self.age_range)] {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(config_error(format!("{name} must be a finite min <= max")));
            }
        }
        let base = &self.base;
        if base.value_per_point <= 0.0 {
            return Err(config_error("base.value_per_point must be positive"));
        }
        if base.floor < 0.0 {
            return Err(config_error("base.floor must not be negative"));
        }
        if base.young_premium_per_year < 0.0 || base.veteran_discount_per_year < 0.0 {
            return Err(config_error("base age adjustments must not be negative"));
        }
        if base.min_multiplier <= 0.0 || base.min_multiplier > 1.0 || base.max_multiplier < 1.0 {
            return Err(config_error(
                "base multipliers must satisfy 0 < min_multiplier <= 1 <= max_multiplier",
            ));
        }
        if base.young_age > base.veteran_age {
            return Err(config_error("base.young_age must not exceed base.veteran_age"));
        }
        let elite = &self.elite;
        if elite.cap < 0.0 || elite.rate < 0.0 || elite.default_strength < 0.0 {
            return Err(config_error("elite cap, rate and strength must not be negative"));
        }
        if elite.competition_strength.values().any(|s| *s < 0.0) {
            return Err(config_error("elite.competition_strength values must not be negative"));
        }
        if self.age_bracket.cap < 0.0 || !self.age_range.contains(self.age_bracket.default_age) {
            return Err(config_error(
                "age_bracket.cap must not be negative and default_age must lie in age_range",
            ));
        }
        if self.combine.elite_weight() < 0.0 {
            return Err(config_error("combine.elite_weight must not be negative"));
        }
        if matches!(self.combine, CombineRule::Multiplicative { .. })
            && self
                .squad_premium
                .values()
                .chain(self.competition_premium.values())
                .any(|f| *f <= 0.0)
        {
            return Err(config_error("multiplicative premiums must be positive"));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(config_error("tolerance must not be negative"));
        }
        Ok(())
    }
}

/// When `user_bids.timestamp` is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Set once when the phase 1 row is created and never touched again.
    #[default]
    OnCreate,
    /// Refreshed on every accepted phase submission (last-modified).
    OnEveryPhase,
}

/// Bidding ledger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Ceiling is `final_mvpa * ceiling_multiplier`; `None` disables the cap.
    pub ceiling_multiplier: Option<f64>,
    /// Reject bids above the ceiling instead of only reporting them.
    pub enforce_ceiling: bool,
    pub timestamp_policy: TimestampPolicy,
    /// Bounded wait for the row lock before reporting a conflict.
    pub lock_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ceiling_multiplier: Some(1.5),
            enforce_ceiling: true,
            timestamp_policy: TimestampPolicy::default(),
            lock_timeout_ms: 2000,
            max_retries: 3,
            retry_backoff_ms: 25,
        }
    }
}

impl LedgerConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(multiplier) = self.ceiling_multiplier {
            if !(multiplier.is_finite() && multiplier > 0.0) {
                return Err(config_error("ledger.ceiling_multiplier must be positive"));
            }
        }
        if self.lock_timeout_ms == 0 {
            return Err(config_error("ledger.lock_timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}
