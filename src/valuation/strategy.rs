//! Pluggable scoring strategies for the valuation engine.
//!
//! A strategy supplies the four scoring functions; the engine handles input
//! validation and rounding. Strategies must be deterministic and total over
//! validated inputs.

use crate::config::{
    AgeBracketConfig, BaseCurveConfig, CombineRule, EliteConfig, StrategyKind, ValuationConfig,
};
use std::collections::BTreeMap;

use super::ValuationInputs;

pub trait ValuationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Monetary baseline; increasing in `p_score`.
    fn base_value(&self, inputs: &ValuationInputs<'_>) -> f64;

    /// Scarcity signal; bounded above.
    fn elite_score(&self, inputs: &ValuationInputs<'_>) -> f64;

    /// Context adjustment; neutral for unknown squads and competitions.
    fn market_premium(&self, inputs: &ValuationInputs<'_>) -> f64;

    fn combine(&self, base_value: f64, elite_score: f64, market_premium: f64) -> f64;
}

/// Build the strategy named by the config.
pub fn build_strategy(config: &ValuationConfig) -> Box<dyn ValuationStrategy> {
    let shared = SharedCurves::from_config(config);
    match config.strategy {
        StrategyKind::Curve => Box::new(CurveStrategy {
            shared,
            elite: config.elite.clone(),
        }),
        StrategyKind::AgeBracket => Box::new(AgeBracketStrategy {
            shared,
            brackets: config.age_bracket.clone(),
        }),
    }
}

/// Lowercased, trimmed form of a squad/competition label.
pub fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// The label without a leading lowercase country code, such as the `eng` in
/// `"eng Premier League"`.
fn strip_country_code(label: &str) -> Option<&str> {
    let (prefix, rest) = label.trim().split_once(' ')?;
    let is_code = (2..=3).contains(&prefix.len()) && prefix.chars().all(|c| c.is_ascii_lowercase());
    (is_code && !rest.trim().is_empty()).then_some(rest)
}

/// Table lookup by normalized label, retrying without a country code.
fn lookup(table: &BTreeMap<String, f64>, label: Option<&str>) -> Option<f64> {
    let label = label?;
    let find = |key: String| {
        table
            .iter()
            .find(|(k, _)| normalize_key(k) == key)
            .map(|(_, v)| *v)
    };
    find(normalize_key(label)).or_else(|| find(normalize_key(strip_country_code(label)?)))
}

/// Base curve and premium lookup, common to every strategy.
#[derive(Debug, Clone)]
struct SharedCurves {
    base: BaseCurveConfig,
    combine: CombineRule,
    squad_premium: BTreeMap<String, f64>,
    competition_premium: BTreeMap<String, f64>,
}

impl SharedCurves {
    fn from_config(config: &ValuationConfig) -> Self {
        Self {
            base: config.base.clone(),
            combine: config.combine,
            squad_premium: config.squad_premium.clone(),
            competition_premium: config.competition_premium.clone(),
        }
    }

    /// 1.0 inside the prime band or when age is unknown.
    fn age_multiplier(&self, age: Option<f64>) -> f64 {
        let b = &self.base;
        match age {
            None => 1.0,
            Some(age) if age < b.young_age => {
                (1.0 + b.young_premium_per_year * (b.young_age - age)).min(b.max_multiplier)
            }
            Some(age) if age > b.veteran_age => {
                (1.0 - b.veteran_discount_per_year * (age - b.veteran_age)).max(b.min_multiplier)
            }
            Some(_) => 1.0,
        }
    }

    fn base_value(&self, inputs: &ValuationInputs<'_>) -> f64 {
        (self.base.floor + self.base.value_per_point * inputs.p_score)
            * self.age_multiplier(inputs.age)
    }

    fn market_premium(&self, inputs: &ValuationInputs<'_>) -> f64 {
        let squad = lookup(&self.squad_premium, inputs.squad);
        let comp = lookup(&self.competition_premium, inputs.comp);
        let neutral = self.combine.neutral_premium();
        match self.combine {
            CombineRule::Multiplicative { .. } => {
                squad.unwrap_or(neutral) * comp.unwrap_or(neutral)
            }
            CombineRule::Additive { .. } => squad.unwrap_or(neutral) + comp.unwrap_or(neutral),
        }
    }
}

/// Elite score saturates towards `cap`, faster in stronger competitions.
#[derive(Debug, Clone)]
pub struct CurveStrategy {
    shared: SharedCurves,
    elite: EliteConfig,
}

impl CurveStrategy {
    fn strength(&self, comp: Option<&str>) -> f64 {
        lookup(&self.elite.competition_strength, comp).unwrap_or(self.elite.default_strength)
    }
}

impl ValuationStrategy for CurveStrategy {
    fn name(&self) -> &'static str {
        "curve"
    }

    fn base_value(&self, inputs: &ValuationInputs<'_>) -> f64 {
        self.shared.base_value(inputs)
    }

    fn elite_score(&self, inputs: &ValuationInputs<'_>) -> f64 {
        let excess = (inputs.p_score - self.elite.threshold).max(0.0);
        let exponent = -self.elite.rate * self.strength(inputs.comp) * excess;
        self.elite.cap * (1.0 - exponent.exp())
    }

    fn market_premium(&self, inputs: &ValuationInputs<'_>) -> f64 {
        self.shared.market_premium(inputs)
    }

    fn combine(&self, base_value: f64, elite_score: f64, market_premium: f64) -> f64 {
        self.shared.combine.combine(base_value, elite_score, market_premium)
    }
}

/// Elite score from prospect, prime and veteran age brackets.
///
/// Brackets are evaluated on a 10-point scale (`p_score / 10`).
#[derive(Debug, Clone)]
pub struct AgeBracketStrategy {
    shared: SharedCurves,
    brackets: AgeBracketConfig,
}

impl ValuationStrategy for AgeBracketStrategy {
    fn name(&self) -> &'static str {
        "age_bracket"
    }

    fn base_value(&self, inputs: &ValuationInputs<'_>) -> f64 {
        self.shared.base_value(inputs)
    }

    fn elite_score(&self, inputs: &ValuationInputs<'_>) -> f64 {
        let p = inputs.p_score / 10.0;
        let age = inputs.age.unwrap_or(self.brackets.default_age);

        let raw = if age <= 23.0 && p > 7.5 {
            (24.0 - age) * p * 3.0
        } else if age > 23.0 && age <= 31.0 && p > 8.0 {
            p * 5.0 * ((32.0 - age) / 9.0)
        } else if age >= 32.0 && p > 7.0 {
            p * 2.0 / (age - 30.0)
        } else {
            0.0
        };

        raw.clamp(0.0, self.brackets.cap)
    }

    fn market_premium(&self, inputs: &ValuationInputs<'_>) -> f64 {
        self.shared.market_premium(inputs)
    }

    fn combine(&self, base_value: f64, elite_score: f64, market_premium: f64) -> f64 {
        self.shared.combine.combine(base_value, elite_score, market_premium)
    }
}
