//! Blend Engine
//!
//! One engine drives every optimisation. Whether it retries is decided by the relaxation strategy
//! it is built with, so the single-solve and relaxing variants share one formulation.

use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::{
    batches::Batch,
    params::OptimizerParams,
    relaxation::{MAX_RETRIES, NoRelaxation, RelaxationStrategy, RelaxationTrace, SmartRelaxation},
    result::{BlendResult, BlendStatus},
    solvers::{
        GoodLpBackend, MilpBackend, SolverError,
        milp::{
            BlendModel,
            observer::{FormulationSummary, ModelObserver, NoopObserver, Tee},
        },
    },
    target::BlendTarget,
};

/// Optimisation engine, parameterised by a relaxation strategy and a solver backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlendEngine<R, B = GoodLpBackend> {
    strategy: R,
    backend: B,
}

impl BlendEngine<NoRelaxation> {
    /// Engine that solves once with the given parameters.
    pub fn single_solve() -> Self {
        Self::new(NoRelaxation, GoodLpBackend)
    }
}

impl BlendEngine<SmartRelaxation> {
    /// Engine that relaxes parameters between attempts using the mode-aware policy.
    pub fn relaxing() -> Self {
        Self::new(SmartRelaxation, GoodLpBackend)
    }
}

impl<R, B> BlendEngine<R, B>
where
    R: RelaxationStrategy,
    B: MilpBackend,
{
    /// Create an engine from a strategy and a backend.
    pub fn new(strategy: R, backend: B) -> Self {
        Self { strategy, backend }
    }

    /// Relaxation strategy in use.
    pub fn strategy(&self) -> &R {
        &self.strategy
    }

    /// Optimise a blend.
    ///
    /// `params` is the starting parameter set; relaxing strategies derive later attempts from it.
    /// Inputs are assumed valid, see [`BlendService`](crate::service::BlendService) for the
    /// validating entry point.
    pub fn optimize(
        &self,
        batches: &[Batch],
        target: &BlendTarget,
        params: &OptimizerParams,
    ) -> BlendResult {
        self.optimize_with_observer(batches, target, params, &mut NoopObserver)
    }

    /// Optimise a blend, reporting every attempt's formulation to `observer`.
    #[instrument(
        name = "blend.optimize",
        skip_all,
        fields(mode = %target.mode, batches = batches.len())
    )]
    pub fn optimize_with_observer(
        &self,
        batches: &[Batch],
        target: &BlendTarget,
        params: &OptimizerParams,
        observer: &mut dyn ModelObserver,
    ) -> BlendResult {
        let started = Instant::now();

        let base = *params;
        let mut current = base;
        let mut trace = RelaxationTrace::new();
        let mut retries = 0;
        let mut exhausted = false;

        let mut result = loop {
            observer.on_attempt_begin(retries);

            let result = self.attempt(batches, target, &current, retries, observer);

            if result.feasible && target.accepts_price(result.predicted.price) {
                break result;
            }

            if !result.status.is_retryable() {
                break result;
            }

            if retries >= MAX_RETRIES {
                exhausted = true;
                trace.mark_exhausted();

                break result;
            }

            let Some(relaxation) = self.strategy.relax(target.mode, retries + 1, &base, &current)
            else {
                break result;
            };

            retries += 1;

            info!(
                attempt = retries,
                status = %result.status,
                relaxation = relaxation.description,
                "retrying with relaxed constraints"
            );

            trace.record(retries, relaxation.description);
            current = relaxation.params;
        };

        result.retry_count = retries;
        result.relaxation_trace = trace.to_string();
        result.exhausted = exhausted;
        result.elapsed = started.elapsed();

        debug!(
            status = %result.status_label(),
            retries,
            elapsed = ?result.elapsed,
            "blend optimisation finished"
        );

        result
    }

    /// Build and solve one formulation.
    fn attempt(
        &self,
        batches: &[Batch],
        target: &BlendTarget,
        params: &OptimizerParams,
        attempt: u32,
        observer: &mut dyn ModelObserver,
    ) -> BlendResult {
        let budget = match params.time_budget() {
            Ok(budget) => budget,
            Err(reason) => {
                error!(%reason, "invalid solver time budget");

                return BlendResult::unsolved(BlendStatus::Abnormal);
            }
        };

        let mut summary = FormulationSummary::default();

        let model = BlendModel::build(
            batches,
            target,
            params,
            &mut Tee {
                first: &mut *observer,
                second: &mut summary,
            },
        );

        debug!(
            attempt,
            fractions = summary.fractions,
            deviation_pairs = summary.deviation_pairs,
            hard_bounded_pairs = summary.hard_bounded_pairs,
            constraints = summary.constraints,
            "formulation ready"
        );

        match model.and_then(|model| model.solve_with(&self.backend, budget, target)) {
            Ok(result) => result,
            Err(SolverError::Unavailable { reason }) => {
                warn!(%reason, "solver backend unavailable");

                BlendResult::unsolved(BlendStatus::SolverNotFound)
            }
            Err(SolverError::OutOfStock) => {
                warn!("no batch has usable stock");

                BlendResult::unsolved(BlendStatus::OutOfStock)
            }
            Err(err @ SolverError::InvariantViolation { .. }) => {
                error!(error = %err, "blend model is inconsistent");

                BlendResult::unsolved(BlendStatus::Abnormal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, time::Duration};

    use testresult::TestResult;

    use crate::{
        attributes::AttributeProfile,
        solvers::{SolveOutcome, SolveStatus, initialise, milp::state::Formulation},
        target::OptimizationMode,
    };

    use super::*;

    /// Reports the same status for every solve and counts calls.
    #[derive(Debug)]
    struct FixedStatus {
        status: SolveStatus,
        calls: Cell<u32>,
    }

    impl FixedStatus {
        fn new(status: SolveStatus) -> Self {
            Self {
                status,
                calls: Cell::new(0),
            }
        }
    }

    impl MilpBackend for FixedStatus {
        fn solve(&self, _: Formulation, _: Duration) -> Result<SolveOutcome, SolverError> {
            self.calls.set(self.calls.get() + 1);

            Ok(SolveOutcome::without_solution(self.status))
        }
    }

    #[derive(Debug)]
    struct Missing;

    impl MilpBackend for Missing {
        fn solve(&self, _: Formulation, _: Duration) -> Result<SolveOutcome, SolverError> {
            Err(SolverError::Unavailable {
                reason: "not installed".to_string(),
            })
        }
    }

    fn batches() -> Vec<Batch> {
        vec![Batch::new(
            "B01",
            "Robusta",
            AttributeProfile::new(115_000.0, 4.0, 8.0, 3.0, 2.5),
            1_000.0,
            30,
        )]
    }

    fn target() -> BlendTarget {
        BlendTarget::new(
            OptimizationMode::Balanced,
            AttributeProfile::new(115_000.0, 4.0, 8.0, 3.0, 2.5),
            100.0,
        )
    }

    #[test]
    fn relaxing_engine_retries_timeouts_until_exhausted() {
        let engine = BlendEngine::new(SmartRelaxation, FixedStatus::new(SolveStatus::Timeout));

        let result = engine.optimize(&batches(), &target(), &OptimizerParams::default());

        assert_eq!(result.status, BlendStatus::Timeout);
        assert_eq!(result.retry_count, MAX_RETRIES);
        assert!(result.exhausted);
        assert_eq!(result.status_label(), "TIMEOUT (Relaxed 3 times)");
        assert_eq!(engine.backend.calls.get(), MAX_RETRIES + 1);
        assert!(result.relaxation_trace.ends_with("Failed after max retries."));
    }

    #[test]
    fn single_solve_engine_never_retries() {
        let engine = BlendEngine::new(NoRelaxation, FixedStatus::new(SolveStatus::Infeasible));

        let result = engine.optimize(&batches(), &target(), &OptimizerParams::default());

        assert_eq!(result.status, BlendStatus::Infeasible);
        assert_eq!(result.retry_count, 0);
        assert!(!result.exhausted);
        assert_eq!(result.status_label(), "INFEASIBLE");
        assert_eq!(engine.backend.calls.get(), 1);
    }

    #[test]
    fn missing_backend_is_terminal() {
        let engine = BlendEngine::new(SmartRelaxation, Missing);

        let result = engine.optimize(&batches(), &target(), &OptimizerParams::default());

        assert_eq!(result.status, BlendStatus::SolverNotFound);
        assert_eq!(result.retry_count, 0);
        assert!(!result.feasible);
    }

    #[test]
    fn out_of_stock_skips_the_solver() {
        let engine = BlendEngine::new(SmartRelaxation, FixedStatus::new(SolveStatus::Optimal));
        let mut batches = batches();

        for batch in &mut batches {
            batch.available_stock = 0.05;
        }

        let result = engine.optimize(&batches, &target(), &OptimizerParams::default());

        assert_eq!(result.status, BlendStatus::OutOfStock);
        assert_eq!(result.retry_count, 0);
        assert_eq!(engine.backend.calls.get(), 0);
    }

    #[test]
    fn matching_single_batch_succeeds_first_time() -> TestResult {
        initialise()?;

        let result = BlendEngine::relaxing().optimize(
            &batches(),
            &target(),
            &OptimizerParams::default(),
        );

        assert!(result.feasible);
        assert_eq!(result.retry_count, 0);
        assert_eq!(result.relaxation_trace, "Start: standard constraints.");
        assert!((result.composition.get("B01").copied().unwrap_or_default() - 1.0).abs() < 1e-6);

        Ok(())
    }
}
