//! Batches

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeProfile};

/// Stock at or below this weight is too small to model.
pub const NEGLIGIBLE_STOCK: f64 = 0.1;

/// A discrete lot of raw material available for blending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Batch identifier, unique within a request
    pub id: String,

    /// Display name
    pub name: String,

    /// Price and sensory attributes
    #[serde(flatten)]
    pub attributes: AttributeProfile,

    /// Available stock (weight)
    pub available_stock: f64,

    /// Days until the batch expires; negative once it has expired
    pub days_to_expiry: i32,
}

impl Batch {
    /// Create a new batch.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        attributes: AttributeProfile,
        available_stock: f64,
        days_to_expiry: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes,
            available_stock,
            days_to_expiry,
        }
    }

    /// Whether the batch has enough stock to be worth modelling.
    pub fn has_usable_stock(&self) -> bool {
        self.available_stock > NEGLIGIBLE_STOCK
    }

    /// Largest share of `total_output` this batch can cover, capped at the whole output.
    pub fn max_fraction(&self, total_output: f64) -> f64 {
        (self.available_stock / total_output).min(1.0)
    }

    /// Check the batch can be modelled.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found: a blank id, a non-finite attribute or
    /// a negative or non-finite stock.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("batch id must not be blank".to_string());
        }

        if let Some(attribute) = Attribute::ALL
            .into_iter()
            .find(|attribute| !self.attributes.get(*attribute).is_finite())
        {
            return Err(format!("{attribute} must be finite"));
        }

        if !self.available_stock.is_finite() || self.available_stock < 0.0 {
            return Err(format!(
                "available stock must be a non-negative number, got {}",
                self.available_stock
            ));
        }

        Ok(())
    }
}
