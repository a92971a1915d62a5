//! Solvers for Blends

use std::time::Duration;

use good_lp::Variable;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::solvers::milp::state::Formulation;

pub mod backend;
pub mod milp;

pub use backend::{GoodLpBackend, initialise, is_initialised};

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// The solver backend cannot be used.
    #[error("solver backend unavailable: {reason}")]
    Unavailable {
        /// Why the backend is unavailable
        reason: String,
    },

    /// Every batch has negligible stock, so there is nothing to model.
    #[error("no batch has usable stock")]
    OutOfStock,

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Status reported by a MILP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// Proven optimal solution
    Optimal,

    /// Feasible solution without an optimality proof
    Feasible,

    /// The constraints cannot be satisfied
    Infeasible,

    /// The objective is unbounded
    Unbounded,

    /// No status within the time budget
    Timeout,

    /// Any other failure
    Abnormal,
}

impl SolveStatus {
    /// Whether the status comes with variable values.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// What a backend returns for one solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Reported status
    pub status: SolveStatus,

    /// Value of every variable, present only when the status has a solution
    pub values: FxHashMap<Variable, f64>,

    /// Achieved objective value (zero without a solution)
    pub objective_value: f64,
}

impl SolveOutcome {
    /// An outcome carrying only a status.
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: FxHashMap::default(),
            objective_value: 0.0,
        }
    }

    /// Solved value of a variable; variables the backend did not report read as zero.
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }
}

/// A MILP solver invoked through a narrow contract.
///
/// Implementations receive a complete formulation and a wall-clock budget, and must return a
/// status (with values for optimal/feasible outcomes) no later than the budget allows.
pub trait MilpBackend {
    /// Solve the formulation within `budget`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Unavailable`] if the backend cannot be used at all. Infeasible,
    /// unbounded and timed-out solves are reported through [`SolveOutcome::status`].
    fn solve(&self, formulation: Formulation, budget: Duration)
    -> Result<SolveOutcome, SolverError>;
}

impl<B: MilpBackend + ?Sized> MilpBackend for &B {
    fn solve(
        &self,
        formulation: Formulation,
        budget: Duration,
    ) -> Result<SolveOutcome, SolverError> {
        (**self).solve(formulation, budget)
    }
}

#[cfg(test)]
mod tests {
    use good_lp::{ProblemVariables, variable};

    use super::*;

    #[test]
    fn missing_values_read_as_zero() {
        let mut pb = ProblemVariables::new();
        let x = pb.add(variable().min(0));
        let y = pb.add(variable().min(0));

        let mut outcome = SolveOutcome::without_solution(SolveStatus::Optimal);
        outcome.values.insert(x, 0.75);

        assert!((outcome.value(x) - 0.75).abs() < f64::EPSILON);
        assert!(outcome.value(y).abs() < f64::EPSILON);
    }

    #[test]
    fn only_optimal_and_feasible_have_solutions() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Timeout.has_solution());
    }
}
