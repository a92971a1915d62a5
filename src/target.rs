//! Blend Target

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeProfile};

/// Fixed hard cap on caffeine deviation, independent of mode and profile.
pub const CAFFEINE_TOLERANCE: f64 = 0.5;

/// Ratio above the target price at which a feasible blend is still considered acceptable.
pub const PRICE_ACCEPTANCE_RATIO: f64 = 1.10;

/// What the blend should favour when price and flavour pull apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationMode {
    /// Cheapest acceptable blend, flavour drift hard-capped
    PriceOptimized,

    /// Closest flavour match, price allowed to stretch
    QualityOptimized,

    /// Middle ground between price and flavour
    #[default]
    Balanced,
}

impl OptimizationMode {
    /// Whether sensory deviations are hard-bounded in this mode.
    pub fn is_price_driven(self) -> bool {
        matches!(self, OptimizationMode::PriceOptimized)
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptimizationMode::PriceOptimized => "PRICE_OPTIMIZED",
            OptimizationMode::QualityOptimized => "QUALITY_OPTIMIZED",
            OptimizationMode::Balanced => "BALANCED",
        })
    }
}

/// Target cost and sensory profile for a blend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendTarget {
    /// Optimization mode
    pub mode: OptimizationMode,

    /// Target price and sensory values.
    ///
    /// A price of zero or below means "no price target"; a negative sensory value means the
    /// attribute is not tracked.
    #[serde(flatten)]
    pub values: AttributeProfile,

    /// Required total output weight
    pub total_output: f64,

    /// Maximum number of distinct batches in the blend; zero means no cap
    #[serde(default)]
    pub max_batch_types: u32,

    /// Minimum share of the output any selected batch must carry
    #[serde(default)]
    pub min_ratio: f64,
}

impl BlendTarget {
    /// Create a target with no cardinality cap and no minimum ratio.
    pub fn new(mode: OptimizationMode, values: AttributeProfile, total_output: f64) -> Self {
        Self {
            mode,
            values,
            total_output,
            max_batch_types: 0,
            min_ratio: 0.0,
        }
    }

    /// Set the cardinality cap.
    #[must_use]
    pub fn with_max_batch_types(mut self, max_batch_types: u32) -> Self {
        self.max_batch_types = max_batch_types;
        self
    }

    /// Set the minimum inclusion ratio.
    #[must_use]
    pub fn with_min_ratio(mut self, min_ratio: f64) -> Self {
        self.min_ratio = min_ratio;
        self
    }

    /// Target price, if one was supplied.
    pub fn price(&self) -> Option<f64> {
        (self.values.price > 0.0).then_some(self.values.price)
    }

    /// Whether the attribute takes part in the model.
    pub fn tracks(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Price => self.price().is_some(),
            _ => self.values.get(attribute) >= 0.0,
        }
    }

    /// Whether a predicted price is within the acceptance band of the target price.
    pub fn accepts_price(&self, predicted_price: f64) -> bool {
        self.price()
            .is_none_or(|price| predicted_price <= price * PRICE_ACCEPTANCE_RATIO)
    }

    /// Check the target describes a solvable request shape.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.total_output.is_finite() || self.total_output <= 0.0 {
            return Err(format!(
                "total output must be positive, got {}",
                self.total_output
            ));
        }

        if !(0.0..=1.0).contains(&self.min_ratio) {
            return Err(format!(
                "minimum ratio must be within [0, 1], got {}",
                self.min_ratio
            ));
        }

        if let Some(attribute) = Attribute::ALL
            .into_iter()
            .find(|attribute| !self.values.get(*attribute).is_finite())
        {
            return Err(format!("target {attribute} must be finite"));
        }

        Ok(())
    }
}
