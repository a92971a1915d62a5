//! `good_lp` Backend
//!
//! Solves blend formulations with whichever `good_lp` solver the crate was compiled with. HiGHS
//! is preferred when the `solver-highs` feature is enabled, otherwise the bundled `microlp`
//! solver is used. Both honour the time budget natively.

use std::{sync::OnceLock, time::Duration};

use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable,
    solvers::{SolutionStatus, WithTimeLimit},
    variable,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;

#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

#[cfg(not(any(feature = "solver-highs", feature = "solver-microlp")))]
compile_error!("enable at least one of the `solver-highs` or `solver-microlp` features");

use crate::solvers::{
    MilpBackend, SolveOutcome, SolveStatus, SolverError, milp::state::Formulation,
};

/// Name of the compiled-in solver.
#[cfg(feature = "solver-highs")]
pub const BACKEND_NAME: &str = "highs";

/// Name of the compiled-in solver.
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
pub const BACKEND_NAME: &str = "microlp";

/// Errors the backends raise when the time limit ran out before any incumbent was found.
const INTERRUPTED_WITHOUT_SOLUTION: [&str; 2] = [
    // microlp
    "Time limit reached before finding a feasible solution",
    // HiGHS
    "NoSolutionFound",
];

static INITIALISED: OnceLock<Result<(), String>> = OnceLock::new();

/// Prepare the solver backend for use.
///
/// Runs a trivial probe problem once per process and remembers the outcome. Later calls return
/// the remembered outcome without solving anything, so this is safe to call from every entry
/// point.
///
/// # Errors
///
/// Returns [`SolverError::Unavailable`] if the probe could not be solved.
pub fn initialise() -> Result<&'static str, SolverError> {
    INITIALISED
        .get_or_init(|| {
            let outcome = probe();

            match &outcome {
                Ok(()) => debug!(backend = BACKEND_NAME, "solver backend initialised"),
                Err(reason) => warn!(backend = BACKEND_NAME, %reason, "solver backend unavailable"),
            }

            outcome
        })
        .clone()
        .map(|()| BACKEND_NAME)
        .map_err(|reason| SolverError::Unavailable { reason })
}

/// Whether [`initialise`] has completed successfully.
pub fn is_initialised() -> bool {
    matches!(INITIALISED.get(), Some(Ok(())))
}

/// Minimise a single binary that must be set; anything but `x = 1` means the backend is broken.
fn probe() -> Result<(), String> {
    let mut pb = good_lp::ProblemVariables::new();
    let x = pb.add(variable().binary());

    let solution = pb
        .minimise(Expression::from(x))
        .using(default_solver)
        .with(Expression::from(x).geq(1))
        .solve()
        .map_err(|err| err.to_string())?;

    if (solution.value(x) - 1.0).abs() > 1e-6 {
        return Err(format!("probe returned x = {}", solution.value(x)));
    }

    Ok(())
}

/// [`MilpBackend`] backed by the compiled-in `good_lp` solver.
///
/// The time budget is passed to the solver as its time limit, so a solve never outlives the
/// call. An incumbent found before the limit is reported as [`SolveStatus::Feasible`]; a limit
/// reached with no incumbent is [`SolveStatus::Timeout`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GoodLpBackend;

impl MilpBackend for GoodLpBackend {
    fn solve(
        &self,
        formulation: Formulation,
        budget: Duration,
    ) -> Result<SolveOutcome, SolverError> {
        if !is_initialised() {
            return Err(SolverError::Unavailable {
                reason: format!("{BACKEND_NAME} backend has not been initialised"),
            });
        }

        Ok(solve_formulation(formulation, budget))
    }
}

/// Run one formulation on the current thread, stopping at the time budget.
fn solve_formulation(formulation: Formulation, budget: Duration) -> SolveOutcome {
    let (pb, objective, variables, constraints) = formulation.into_parts();

    trace!(
        backend = BACKEND_NAME,
        variables = variables.len(),
        constraints = constraints.len(),
        budget_secs = budget.as_secs_f64(),
        "solving formulation"
    );

    let mut model = pb
        .minimise(objective.clone())
        .using(default_solver)
        .with_time_limit(budget.as_secs_f64());

    for constraint in &constraints {
        model = model.with(constraint.to_constraint());
    }

    match model.solve() {
        Ok(solution) => {
            let status = solved_status(solution.status());

            if status == SolveStatus::Feasible {
                warn!(budget = ?budget, "solver stopped at its limit with an unproven incumbent");
            }

            let values: FxHashMap<Variable, f64> = variables
                .iter()
                .map(|&var| (var, solution.value(var)))
                .collect();

            SolveOutcome {
                status,
                objective_value: solution.eval(&objective),
                values,
            }
        }
        Err(err) => {
            let status = failed_status(&err);

            match status {
                SolveStatus::Timeout => warn!(budget = ?budget, "solver exceeded its time budget"),
                SolveStatus::Abnormal => warn!(error = %err, "solver failed"),
                _ => {}
            }

            SolveOutcome::without_solution(status)
        }
    }
}

/// Status of a solve that returned a solution.
fn solved_status(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::TimeLimit | SolutionStatus::GapLimit => SolveStatus::Feasible,
    }
}

/// Status of a solve that returned no solution.
fn failed_status(err: &ResolutionError) -> SolveStatus {
    match err {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        ResolutionError::Other(message) if INTERRUPTED_WITHOUT_SOLUTION.contains(message) => {
            SolveStatus::Timeout
        }
        ResolutionError::Other(_) | ResolutionError::Str(_) => SolveStatus::Abnormal,
    }
}
