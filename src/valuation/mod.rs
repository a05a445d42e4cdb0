//! Valuation engine: turns scouting signals into a player's market value.
//!
//! The engine is pure. It validates inputs, runs the configured
//! [`ValuationStrategy`] and rounds every component to cents (values are in
//! millions). `final_mvpa` is always combined from the *rounded* components,
//! so a stored valuation can be re-derived exactly from its own fields.
//! Persisting the result is the storage layer's job.

pub mod percentile;
pub mod strategy;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{
    config::{InputRange, ValuationConfig},
    error::{Result, VigiballError},
    storage::Player,
};

pub use percentile::{compute_p_score, PScoreBreakdown, PositionGroup, StatLine};
pub use strategy::{build_strategy, AgeBracketStrategy, CurveStrategy, ValuationStrategy};

/// The fields of a player the scoring functions may read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationInputs<'a> {
    pub p_score: f64,
    pub age: Option<f64>,
    pub squad: Option<&'a str>,
    pub comp: Option<&'a str>,
}

impl<'a> ValuationInputs<'a> {
    pub fn from_player(player: &'a Player) -> Option<Self> {
        Some(Self {
            p_score: player.p_score?,
            age: player.age,
            squad: player.squad.as_deref(),
            comp: player.comp.as_deref(),
        })
    }
}

/// Derived valuation fields of a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub base_value: f64,
    pub elite_score: f64,
    pub market_premium: f64,
    pub final_mvpa: f64,
}

/// Round to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validates inputs and applies a strategy.
pub struct ValuationEngine {
    strategy: Box<dyn ValuationStrategy>,
    p_score_range: InputRange,
    age_range: InputRange,
    tolerance: f64,
}

impl std::fmt::Debug for ValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationEngine")
            .field("strategy", &self.strategy.name())
            .field("p_score_range", &self.p_score_range)
            .field("age_range", &self.age_range)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl ValuationEngine {
    pub fn from_config(config: &ValuationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            strategy: build_strategy(config),
            p_score_range: config.p_score_range,
            age_range: config.age_range,
            tolerance: config.tolerance,
        })
    }

    /// Use a custom strategy with the input limits and tolerance of `config`.
    pub fn with_strategy(
        config: &ValuationConfig,
        strategy: Box<dyn ValuationStrategy>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            strategy,
            p_score_range: config.p_score_range,
            age_range: config.age_range,
            tolerance: config.tolerance,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Reject out-of-range scouting data rather than clamping it.
    pub fn validate(&self, inputs: &ValuationInputs<'_>) -> Result<()> {
        if !self.p_score_range.contains(inputs.p_score) {
            return Err(VigiballError::invalid(
                "p_score",
                format!(
                    "{} is outside {}..={}",
                    inputs.p_score, self.p_score_range.min, self.p_score_range.max
                ),
            ));
        }
        self.validate_age(inputs.age)
    }

    fn validate_age(&self, age: Option<f64>) -> Result<()> {
        match age {
            Some(age) if !self.age_range.contains(age) => Err(VigiballError::invalid(
                "age",
                format!("{} is outside {}..={}", age, self.age_range.min, self.age_range.max),
            )),
            _ => Ok(()),
        }
    }

    pub fn valuate(&self, inputs: &ValuationInputs<'_>) -> Result<Valuation> {
        self.validate(inputs)?;

        let base_value = round_cents(self.strategy.base_value(inputs));
        let elite_score = round_cents(self.strategy.elite_score(inputs));
        let market_premium = round_cents(self.strategy.market_premium(inputs));
        let final_mvpa = round_cents(self.strategy.combine(base_value, elite_score, market_premium));

        Ok(Valuation {
            base_value,
            elite_score,
            market_premium,
            final_mvpa,
        })
    }

    /// Return `player` with its valuation fields recomputed.
    ///
    /// A player without a `p_score` has not been scouted yet; its valuation
    /// fields are cleared instead of failing.
    pub fn recompute(&self, player: &Player) -> Result<Player> {
        let mut updated = player.clone();
        match ValuationInputs::from_player(player) {
            Some(inputs) => updated.set_valuation(Some(self.valuate(&inputs)?)),
            None => {
                self.validate_age(player.age)?;
                updated.set_valuation(None);
            }
        }
        Ok(updated)
    }

    /// Whether the cached `final_mvpa` agrees with a fresh recompute.
    ///
    /// Invalid inputs are never fresh.
    pub fn is_fresh(&self, player: &Player) -> bool {
        match self.recompute(player) {
            Ok(fresh) => match (player.final_mvpa, fresh.final_mvpa) {
                (Some(cached), Some(recomputed)) => (cached - recomputed).abs() <= self.tolerance,
                (None, None) => true,
                _ => false,
            },
            Err(_) => false,
        }
    }
}
