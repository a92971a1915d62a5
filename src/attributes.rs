//! Blend Attributes

use std::fmt;

use serde::{Deserialize, Serialize};

/// A property tracked for every batch and predicted for every blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Price per unit weight
    Price,

    /// Acidity score
    Acid,

    /// Bitterness score
    Bitter,

    /// Sweetness score
    Sweet,

    /// Caffeine content
    Caffeine,
}

impl Attribute {
    /// Every tracked attribute, price first.
    pub const ALL: [Attribute; 5] = [
        Attribute::Price,
        Attribute::Acid,
        Attribute::Bitter,
        Attribute::Sweet,
        Attribute::Caffeine,
    ];

    /// The four sensory attributes.
    pub const SENSORY: [Attribute; 4] = [
        Attribute::Acid,
        Attribute::Bitter,
        Attribute::Sweet,
        Attribute::Caffeine,
    ];

    /// Attributes contributing to the similarity score.
    pub const FLAVOR: [Attribute; 3] = [Attribute::Acid, Attribute::Bitter, Attribute::Sweet];

    /// Short lowercase label, also used for solver variable names.
    pub fn label(self) -> &'static str {
        match self {
            Attribute::Price => "price",
            Attribute::Acid => "acid",
            Attribute::Bitter => "bitter",
            Attribute::Sweet => "sweet",
            Attribute::Caffeine => "caffeine",
        }
    }

    /// Whether this is one of the sensory attributes.
    pub fn is_sensory(self) -> bool {
        !matches!(self, Attribute::Price)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Attribute`].
///
/// Used for batch properties, target values and predicted blend properties alike, so all three
/// are guaranteed to share a scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeProfile {
    /// Price per unit weight
    pub price: f64,

    /// Acidity score
    pub acid: f64,

    /// Bitterness score
    pub bitter: f64,

    /// Sweetness score
    pub sweet: f64,

    /// Caffeine content
    pub caffeine: f64,
}

impl AttributeProfile {
    /// Create a profile from its five values.
    pub fn new(price: f64, acid: f64, bitter: f64, sweet: f64, caffeine: f64) -> Self {
        Self {
            price,
            acid,
            bitter,
            sweet,
            caffeine,
        }
    }

    /// Value of a single attribute.
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Price => self.price,
            Attribute::Acid => self.acid,
            Attribute::Bitter => self.bitter,
            Attribute::Sweet => self.sweet,
            Attribute::Caffeine => self.caffeine,
        }
    }

    /// Mutable access to a single attribute.
    pub fn get_mut(&mut self, attribute: Attribute) -> &mut f64 {
        match attribute {
            Attribute::Price => &mut self.price,
            Attribute::Acid => &mut self.acid,
            Attribute::Bitter => &mut self.bitter,
            Attribute::Sweet => &mut self.sweet,
            Attribute::Caffeine => &mut self.caffeine,
        }
    }

    /// Accumulate `share` of `other` into this profile.
    pub fn add_weighted(&mut self, other: &AttributeProfile, share: f64) {
        for attribute in Attribute::ALL {
            *self.get_mut(attribute) += share * other.get(attribute);
        }
    }
}
