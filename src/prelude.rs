//! Blend optimizer prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    attributes::{Attribute, AttributeProfile},
    batches::Batch,
    engine::BlendEngine,
    params::{MarketProfile, OptimizerParams, SensoryWeights},
    relaxation::{NoRelaxation, RelaxationStrategy, RelaxationTrace, SmartRelaxation},
    report::{ReportError, write_report},
    result::{BlendResult, BlendStatus},
    service::{Algorithm, BlendError, BlendRequest, BlendService},
    solvers::{
        GoodLpBackend, MilpBackend, SolveOutcome, SolveStatus, SolverError, initialise,
        milp::{BlendModel, DeviationBounds, FormulationSummary, ModelObserver, NoopObserver},
    },
    target::{BlendTarget, OptimizationMode},
};
