//! Blend Service
//!
//! Validating entry point: checks a request, picks the parameter set and the engine variant,
//! then hands over to [`BlendEngine`].

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    batches::Batch,
    engine::BlendEngine,
    params::OptimizerParams,
    relaxation::{NoRelaxation, SmartRelaxation},
    result::BlendResult,
    solvers::{GoodLpBackend, MilpBackend},
    target::BlendTarget,
};

/// Errors raised before any model is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlendError {
    /// The request carried no batches.
    #[error("at least one batch is required")]
    EmptyBatches,

    /// The request carried no target.
    #[error("a blend target is required")]
    MissingTarget,

    /// The target cannot describe a blend.
    #[error("invalid target: {reason}")]
    InvalidTarget {
        /// What is wrong with the target
        reason: String,
    },

    /// The parameter override is unusable.
    #[error("invalid optimizer parameters: {reason}")]
    InvalidParams {
        /// What is wrong with the parameters
        reason: String,
    },

    /// A batch cannot be modelled.
    #[error("invalid batch {id}: {reason}")]
    InvalidBatch {
        /// Offending batch id
        id: String,

        /// What is wrong with the batch
        reason: String,
    },
}

/// Engine variant selected by a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Solve once with the active parameters
    #[default]
    #[serde(rename = "DEFAULT", alias = "default", alias = "STANDARD", alias = "standard")]
    Standard,

    /// Relax parameters between attempts until the blend is acceptable
    #[serde(rename = "HYBRID", alias = "hybrid", alias = "RELAXING", alias = "relaxing")]
    Relaxing,
}

impl Algorithm {
    /// Parse a selector, case-insensitively.
    ///
    /// `HYBRID` selects the relaxing engine; anything else selects the single-solve engine.
    pub fn from_selector(selector: &str) -> Self {
        let selector = selector.trim();

        if selector.eq_ignore_ascii_case("HYBRID") || selector.eq_ignore_ascii_case("RELAXING") {
            return Algorithm::Relaxing;
        }

        if !(selector.eq_ignore_ascii_case("DEFAULT") || selector.eq_ignore_ascii_case("STANDARD"))
        {
            warn!(selector, "unknown algorithm selector, using the single-solve engine");
        }

        Algorithm::Standard
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Standard => "DEFAULT",
            Algorithm::Relaxing => "HYBRID",
        })
    }
}

/// An inbound blend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendRequest {
    /// Candidate batches
    pub batches: Vec<Batch>,

    /// Target profile
    pub target: Option<BlendTarget>,

    /// Parameter override; the mode's market profile is used when absent
    #[serde(default)]
    pub params: Option<OptimizerParams>,

    /// Engine variant
    #[serde(default)]
    pub algorithm: Algorithm,
}

impl BlendRequest {
    /// Create a request with the mode-derived parameters and the single-solve engine.
    pub fn new(batches: Vec<Batch>, target: BlendTarget) -> Self {
        Self {
            batches,
            target: Some(target),
            params: None,
            algorithm: Algorithm::default(),
        }
    }

    /// Override the parameter set.
    #[must_use]
    pub fn with_params(mut self, params: OptimizerParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Select the engine variant.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Validates requests and dispatches them to the selected engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlendService<B = GoodLpBackend> {
    backend: B,
}

impl BlendService {
    /// Service backed by the compiled-in solver.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: MilpBackend> BlendService<B> {
    /// Service backed by a custom solver.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Optimise a blend request.
    ///
    /// Solver-level failures (infeasible, timed out, out of stock, no solver) are reported in
    /// the returned result, not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError`] if the request is rejected before any model is built.
    pub fn optimize(&self, request: &BlendRequest) -> Result<BlendResult, BlendError> {
        validate_batches(&request.batches)?;

        let target = request.target.as_ref().ok_or(BlendError::MissingTarget)?;

        target
            .validate()
            .map_err(|reason| BlendError::InvalidTarget { reason })?;

        let params = request
            .params
            .unwrap_or_else(|| OptimizerParams::for_mode(target.mode));

        params
            .validate()
            .map_err(|reason| BlendError::InvalidParams { reason })?;

        let result = match request.algorithm {
            Algorithm::Standard => BlendEngine::new(NoRelaxation, &self.backend).optimize(
                &request.batches,
                target,
                &params,
            ),
            Algorithm::Relaxing => BlendEngine::new(SmartRelaxation, &self.backend).optimize(
                &request.batches,
                target,
                &params,
            ),
        };

        Ok(result)
    }
}

/// Reject batch lists the model cannot represent faithfully.
///
/// Ids key the composition, so they must be unique within a request.
fn validate_batches(batches: &[Batch]) -> Result<(), BlendError> {
    if batches.is_empty() {
        return Err(BlendError::EmptyBatches);
    }

    let mut seen = FxHashSet::default();

    for batch in batches {
        batch.validate().map_err(|reason| BlendError::InvalidBatch {
            id: batch.id.clone(),
            reason,
        })?;

        if !seen.insert(batch.id.as_str()) {
            return Err(BlendError::InvalidBatch {
                id: batch.id.clone(),
                reason: "duplicate batch id".to_string(),
            });
        }
    }

    Ok(())
}
