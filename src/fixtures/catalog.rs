//! Catalog Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    batches::Batch,
    params::{MarketProfile, OptimizerParams},
    target::BlendTarget,
};

/// Wrapper for a batch catalog and its named targets in YAML
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFixture {
    /// Batches on offer
    pub batches: Vec<Batch>,

    /// Map of target name -> target fixture
    #[serde(default)]
    pub targets: FxHashMap<String, TargetFixture>,
}

/// Target fixture from YAML
///
/// Parameters are resolved in order: an explicit `params` block, then a named `profile`, then
/// the profile for the target's mode.
#[derive(Debug, Deserialize)]
pub struct TargetFixture {
    /// The target itself
    #[serde(flatten)]
    pub target: BlendTarget,

    /// Named market profile to optimise with
    #[serde(default)]
    pub profile: Option<MarketProfile>,

    /// Explicit parameter override
    #[serde(default)]
    pub params: Option<OptimizerParams>,
}

impl TargetFixture {
    /// Parameter override carried by this fixture, if any.
    pub fn params(&self) -> Option<OptimizerParams> {
        self.params
            .or_else(|| self.profile.map(MarketProfile::params))
    }
}
