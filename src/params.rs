//! Optimizer Parameters
//!
//! Tunable knobs for the blend model, plus three calibrated market profiles. Prices are in the
//! same currency units as batch prices (the calibration assumes roughly 120k-140k per kg for
//! commodity Robusta).

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{attributes::Attribute, target::OptimizationMode};

/// Relative importance of each sensory attribute in the flavour penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensoryWeights {
    /// Acidity weight
    pub acid: f64,

    /// Bitterness weight
    pub bitter: f64,

    /// Sweetness weight
    pub sweet: f64,

    /// Caffeine weight
    pub caffeine: f64,
}

impl SensoryWeights {
    /// Weight for an attribute. Price carries no flavour weight.
    pub fn weight(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Price => 0.0,
            Attribute::Acid => self.acid,
            Attribute::Bitter => self.bitter,
            Attribute::Sweet => self.sweet,
            Attribute::Caffeine => self.caffeine,
        }
    }
}

/// Parameters controlling tolerances, penalties and the solver time budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerParams {
    /// Absolute price tolerance above the target price
    pub price_tolerance: f64,

    /// Absolute sensory tolerance (hard bound in price-driven mode)
    pub flavor_tolerance: f64,

    /// Objective cost per unit of sensory deviation
    pub flavor_penalty_per_unit: f64,

    /// Objective cost per day until expiry, biasing towards older stock
    pub expiry_penalty_per_day: f64,

    /// Per-attribute weights applied to the flavour penalty
    pub weights: SensoryWeights,

    /// Wall-clock budget for a single solve, in seconds
    pub solver_time_budget_secs: f64,
}

impl OptimizerParams {
    /// Mass market: cheapest possible, tolerant of flavour drift, pushes old stock hard.
    pub fn mass_market() -> Self {
        Self {
            price_tolerance: 1_000.0,
            flavor_tolerance: 1.5,
            flavor_penalty_per_unit: 5_000.0,
            expiry_penalty_per_day: 200.0,
            weights: SensoryWeights {
                acid: 0.5,
                bitter: 1.5,
                sweet: 0.5,
                caffeine: 1.0,
            },
            solver_time_budget_secs: 5.0,
        }
    }

    /// Balanced market: the mid-range cafe profile.
    pub fn balanced_market() -> Self {
        Self {
            price_tolerance: 5_000.0,
            flavor_tolerance: 0.5,
            flavor_penalty_per_unit: 20_000.0,
            expiry_penalty_per_day: 100.0,
            weights: SensoryWeights {
                acid: 1.0,
                bitter: 2.0,
                sweet: 1.0,
                caffeine: 1.0,
            },
            solver_time_budget_secs: 5.0,
        }
    }

    /// Specialty market: flavour first, price may stretch, fresh stock is fine.
    pub fn specialty_market() -> Self {
        Self {
            price_tolerance: 20_000.0,
            flavor_tolerance: 0.2,
            flavor_penalty_per_unit: 100_000.0,
            expiry_penalty_per_day: 20.0,
            weights: SensoryWeights {
                acid: 2.0,
                bitter: 1.0,
                sweet: 2.0,
                caffeine: 0.5,
            },
            solver_time_budget_secs: 10.0,
        }
    }

    /// Default profile for a target mode.
    pub fn for_mode(mode: OptimizationMode) -> Self {
        MarketProfile::for_mode(mode).params()
    }

    /// Set the price tolerance.
    #[must_use]
    pub fn with_price_tolerance(mut self, price_tolerance: f64) -> Self {
        self.price_tolerance = price_tolerance;
        self
    }

    /// Set the flavour tolerance.
    #[must_use]
    pub fn with_flavor_tolerance(mut self, flavor_tolerance: f64) -> Self {
        self.flavor_tolerance = flavor_tolerance;
        self
    }

    /// Set the flavour penalty per unit of deviation.
    #[must_use]
    pub fn with_flavor_penalty_per_unit(mut self, flavor_penalty_per_unit: f64) -> Self {
        self.flavor_penalty_per_unit = flavor_penalty_per_unit;
        self
    }

    /// Set the expiry penalty per day.
    #[must_use]
    pub fn with_expiry_penalty_per_day(mut self, expiry_penalty_per_day: f64) -> Self {
        self.expiry_penalty_per_day = expiry_penalty_per_day;
        self
    }

    /// Set the solver time budget in seconds.
    #[must_use]
    pub fn with_solver_time_budget_secs(mut self, secs: f64) -> Self {
        self.solver_time_budget_secs = secs;
        self
    }

    /// Solver time budget as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns a description if the budget is not a positive, finite number of seconds.
    pub fn time_budget(&self) -> Result<Duration, String> {
        if self.solver_time_budget_secs <= 0.0 {
            return Err(format!(
                "solver time budget must be positive, got {}",
                self.solver_time_budget_secs
            ));
        }

        Duration::try_from_secs_f64(self.solver_time_budget_secs).map_err(|err| {
            format!(
                "solver time budget {} is not representable: {err}",
                self.solver_time_budget_secs
            )
        })
    }

    /// Check every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid parameter.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("price tolerance", self.price_tolerance),
            ("flavor tolerance", self.flavor_tolerance),
            ("flavor penalty", self.flavor_penalty_per_unit),
            ("expiry penalty", self.expiry_penalty_per_day),
            ("acid weight", self.weights.acid),
            ("bitter weight", self.weights.bitter),
            ("sweet weight", self.weights.sweet),
            ("caffeine weight", self.weights.caffeine),
        ];

        if let Some((name, value)) = non_negative
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(format!("{name} must be finite and non-negative, got {value}"));
        }

        self.time_budget().map(|_| ())
    }
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self::balanced_market()
    }
}

/// Named calibrated parameter profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketProfile {
    /// See [`OptimizerParams::mass_market`]
    Mass,

    /// See [`OptimizerParams::balanced_market`]
    Balanced,

    /// See [`OptimizerParams::specialty_market`]
    Specialty,
}

impl MarketProfile {
    /// Profile selected by default for a target mode.
    pub fn for_mode(mode: OptimizationMode) -> Self {
        match mode {
            OptimizationMode::PriceOptimized => MarketProfile::Mass,
            OptimizationMode::QualityOptimized => MarketProfile::Specialty,
            OptimizationMode::Balanced => MarketProfile::Balanced,
        }
    }

    /// Calibrated parameters for this profile.
    pub fn params(self) -> OptimizerParams {
        match self {
            MarketProfile::Mass => OptimizerParams::mass_market(),
            MarketProfile::Balanced => OptimizerParams::balanced_market(),
            MarketProfile::Specialty => OptimizerParams::specialty_market(),
        }
    }
}

impl fmt::Display for MarketProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketProfile::Mass => "mass",
            MarketProfile::Balanced => "balanced",
            MarketProfile::Specialty => "specialty",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_map_to_their_market_profiles() {
        assert_eq!(
            OptimizerParams::for_mode(OptimizationMode::PriceOptimized),
            OptimizerParams::mass_market()
        );
        assert_eq!(
            OptimizerParams::for_mode(OptimizationMode::QualityOptimized),
            OptimizerParams::specialty_market()
        );
        assert_eq!(
            OptimizerParams::for_mode(OptimizationMode::Balanced),
            OptimizerParams::default()
        );
    }

    #[test]
    fn profiles_trade_flavour_against_freshness() {
        let mass = OptimizerParams::mass_market();
        let specialty = OptimizerParams::specialty_market();

        assert!(mass.flavor_tolerance > specialty.flavor_tolerance);
        assert!(mass.expiry_penalty_per_day > specialty.expiry_penalty_per_day);
        assert!(mass.flavor_penalty_per_unit < specialty.flavor_penalty_per_unit);
    }

    #[test]
    fn price_carries_no_flavour_weight() {
        let weights = OptimizerParams::balanced_market().weights;

        assert!(weights.weight(Attribute::Price).abs() < f64::EPSILON);
        assert!((weights.weight(Attribute::Bitter) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn calibrated_profiles_validate() {
        for profile in [
            MarketProfile::Mass,
            MarketProfile::Balanced,
            MarketProfile::Specialty,
        ] {
            assert_eq!(profile.params().validate(), Ok(()), "{profile} profile");
        }
    }

    #[test]
    fn validate_rejects_negative_penalty_and_zero_budget() {
        let negative = OptimizerParams::default().with_expiry_penalty_per_day(-1.0);
        let no_budget = OptimizerParams::default().with_solver_time_budget_secs(0.0);

        assert!(negative.validate().is_err());
        assert!(no_budget.validate().is_err());
        assert!(no_budget.time_budget().is_err());
    }

    #[test]
    fn time_budget_converts_seconds() {
        let budget = OptimizerParams::specialty_market().time_budget();

        assert_eq!(budget, Ok(Duration::from_secs(10)));
    }
}
