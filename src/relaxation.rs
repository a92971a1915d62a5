//! Relaxation
//!
//! Strategies that loosen the optimiser parameters between solve attempts.

use std::fmt;

use smallvec::SmallVec;

use crate::{params::OptimizerParams, target::OptimizationMode};

/// Most relaxation steps a relaxing engine applies before giving up.
pub const MAX_RETRIES: u32 = 3;

/// A relaxed parameter set, and what was relaxed to get it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    /// Parameters for the next attempt
    pub params: OptimizerParams,

    /// Human-readable description, recorded in the trace
    pub description: &'static str,
}

/// Decides how to loosen parameters after a failed attempt.
pub trait RelaxationStrategy {
    /// Relax `current` for retry `step` (one-based).
    ///
    /// `base` is the parameter set the first attempt used. Returning `None` stops the loop
    /// after the current attempt.
    fn relax(
        &self,
        mode: OptimizationMode,
        step: u32,
        base: &OptimizerParams,
        current: &OptimizerParams,
    ) -> Option<Relaxation>;
}

/// Never relaxes: the engine solves once.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRelaxation;

impl RelaxationStrategy for NoRelaxation {
    fn relax(
        &self,
        _: OptimizationMode,
        _: u32,
        _: &OptimizerParams,
        _: &OptimizerParams,
    ) -> Option<Relaxation> {
        None
    }
}

/// Mode-aware relaxation policy.
///
/// Steps are cumulative: each one starts from the previous step's parameters.
///
/// | Step | Price optimised      | Quality optimised                         | Balanced                      |
/// |------|----------------------|-------------------------------------------|-------------------------------|
/// | 1    | flavour tol + 1.0    | price tol × 1.10                          | flavour tol + 0.5             |
/// | 2    | price tol × 1.05     | flavour tol + 0.2                         | price tol × 1.05              |
/// | 3    | flavour penalty × 0.8| price tol = base × 1.20, expiry pen × 0.5 | flavour tol + 0.5, price × 1.05 |
#[derive(Debug, Default, Clone, Copy)]
pub struct SmartRelaxation;

impl RelaxationStrategy for SmartRelaxation {
    fn relax(
        &self,
        mode: OptimizationMode,
        step: u32,
        base: &OptimizerParams,
        current: &OptimizerParams,
    ) -> Option<Relaxation> {
        let p = *current;

        let (params, description) = match (mode, step) {
            (OptimizationMode::PriceOptimized, 1) => (
                p.with_flavor_tolerance(p.flavor_tolerance + 1.0),
                "Relaxed flavor tolerance (+1.0).",
            ),
            (OptimizationMode::PriceOptimized, 2) => (
                p.with_price_tolerance(p.price_tolerance * 1.05),
                "Increased price tolerance (+5%).",
            ),
            (OptimizationMode::PriceOptimized, 3) => (
                p.with_flavor_penalty_per_unit(p.flavor_penalty_per_unit * 0.8),
                "Reduced flavor penalty weight (-20%).",
            ),
            (OptimizationMode::QualityOptimized, 1) => (
                p.with_price_tolerance(p.price_tolerance * 1.10),
                "Increased price tolerance (+10%).",
            ),
            (OptimizationMode::QualityOptimized, 2) => (
                p.with_flavor_tolerance(p.flavor_tolerance + 0.2),
                "Relaxed flavor tolerance (+0.2).",
            ),
            (OptimizationMode::QualityOptimized, 3) => (
                p.with_price_tolerance(base.price_tolerance * 1.20)
                    .with_expiry_penalty_per_day(p.expiry_penalty_per_day * 0.5),
                "Increased price tolerance (+20% of base) and halved expiry penalty.",
            ),
            (OptimizationMode::Balanced, 1) => (
                p.with_flavor_tolerance(p.flavor_tolerance + 0.5),
                "Relaxed flavor tolerance (+0.5).",
            ),
            (OptimizationMode::Balanced, 2) => (
                p.with_price_tolerance(p.price_tolerance * 1.05),
                "Increased price tolerance (+5%).",
            ),
            (OptimizationMode::Balanced, 3) => (
                p.with_flavor_tolerance(p.flavor_tolerance + 0.5)
                    .with_price_tolerance(p.price_tolerance * 1.05),
                "Relaxed flavor tolerance (+0.5) and increased price tolerance (+5%).",
            ),
            _ => return None,
        };

        Some(Relaxation {
            params,
            description,
        })
    }
}

/// Human-readable record of a relaxation run.
///
/// Renders as `Start: standard constraints.`, followed by one `Retry #k: ...` line per
/// relaxation and a closing line if retries ran out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaxationTrace {
    steps: SmallVec<[(u32, &'static str); 3]>,
    exhausted: bool,
}

impl RelaxationTrace {
    /// Start an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a relaxation applied before retry `step`.
    pub fn record(&mut self, step: u32, description: &'static str) {
        self.steps.push((step, description));
    }

    /// Record that retries ran out.
    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// Relaxations recorded so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing has been relaxed.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for RelaxationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Start: standard constraints.")?;

        for (step, description) in &self.steps {
            write!(f, "\nRetry #{step}: {description}")?;
        }

        if self.exhausted {
            f.write_str("\nFailed after max retries.")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mode: OptimizationMode, base: OptimizerParams) -> Vec<OptimizerParams> {
        let mut current = base;
        let mut steps = Vec::new();

        for step in 1..=MAX_RETRIES {
            if let Some(relaxation) = SmartRelaxation.relax(mode, step, &base, &current) {
                current = relaxation.params;
                steps.push(current);
            }
        }

        steps
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn price_optimised_policy_is_cumulative() {
        let base = OptimizerParams::mass_market();
        let steps = run(OptimizationMode::PriceOptimized, base);

        let [first, second, third] = steps.as_slice() else {
            panic!("expected three steps, got {}", steps.len());
        };

        assert!(close(first.flavor_tolerance, 2.5));
        assert!(close(second.flavor_tolerance, 2.5));
        assert!(close(second.price_tolerance, 1050.0));
        assert!(close(third.flavor_penalty_per_unit, 4000.0));
        assert!(close(third.price_tolerance, 1050.0));
    }

    #[test]
    fn quality_optimised_step_three_resets_price_from_base() {
        let base = OptimizerParams::specialty_market();
        let steps = run(OptimizationMode::QualityOptimized, base);

        let [first, second, third] = steps.as_slice() else {
            panic!("expected three steps, got {}", steps.len());
        };

        assert!(close(first.price_tolerance, 22_000.0));
        assert!(close(second.flavor_tolerance, 0.4));
        assert!(close(third.price_tolerance, 24_000.0));
        assert!(close(third.expiry_penalty_per_day, 10.0));
    }

    #[test]
    fn balanced_step_three_combines_previous_steps() {
        let base = OptimizerParams::balanced_market();
        let steps = run(OptimizationMode::Balanced, base);

        let [first, second, third] = steps.as_slice() else {
            panic!("expected three steps, got {}", steps.len());
        };

        assert!(close(first.flavor_tolerance, 1.0));
        assert!(close(second.price_tolerance, 5250.0));
        assert!(close(third.flavor_tolerance, 1.5));
        assert!(close(third.price_tolerance, 5512.5));
    }

    #[test]
    fn steps_beyond_the_policy_stop_relaxing() {
        let base = OptimizerParams::default();

        assert!(
            SmartRelaxation
                .relax(OptimizationMode::Balanced, 4, &base, &base)
                .is_none()
        );
        assert!(
            NoRelaxation
                .relax(OptimizationMode::Balanced, 1, &base, &base)
                .is_none()
        );
    }

    #[test]
    fn trace_renders_every_step() {
        let mut trace = RelaxationTrace::new();
        assert_eq!(trace.to_string(), "Start: standard constraints.");

        trace.record(1, "Relaxed flavor tolerance (+0.5).");
        trace.record(2, "Increased price tolerance (+5%).");
        trace.mark_exhausted();

        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.to_string(),
            "Start: standard constraints.\n\
             Retry #1: Relaxed flavor tolerance (+0.5).\n\
             Retry #2: Increased price tolerance (+5%).\n\
             Failed after max retries."
        );
    }
}
