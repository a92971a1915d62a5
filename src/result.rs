//! Blend Result

use std::{fmt, time::Duration};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{attributes::AttributeProfile, solvers::SolveStatus};

/// Outcome status of a blend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendStatus {
    /// Proven optimal blend
    Optimal,

    /// Feasible blend, optimality not proven
    Feasible,

    /// No blend satisfies the hard constraints
    Infeasible,

    /// Objective unbounded (indicates a malformed model)
    Unbounded,

    /// The solver did not report within the time budget
    Timeout,

    /// The solver failed for another reason
    Abnormal,

    /// Every batch had negligible stock; nothing was solved
    OutOfStock,

    /// No usable solver backend
    SolverNotFound,
}

impl BlendStatus {
    /// Whether the status carries a usable blend.
    pub fn is_feasible(self) -> bool {
        matches!(self, BlendStatus::Optimal | BlendStatus::Feasible)
    }

    /// Whether the relaxation loop may react to this status.
    ///
    /// Out-of-stock and missing-solver outcomes are terminal.
    pub fn is_retryable(self) -> bool {
        !matches!(self, BlendStatus::OutOfStock | BlendStatus::SolverNotFound)
    }
}

impl From<SolveStatus> for BlendStatus {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => BlendStatus::Optimal,
            SolveStatus::Feasible => BlendStatus::Feasible,
            SolveStatus::Infeasible => BlendStatus::Infeasible,
            SolveStatus::Unbounded => BlendStatus::Unbounded,
            SolveStatus::Timeout => BlendStatus::Timeout,
            SolveStatus::Abnormal => BlendStatus::Abnormal,
        }
    }
}

impl fmt::Display for BlendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlendStatus::Optimal => "OPTIMAL",
            BlendStatus::Feasible => "FEASIBLE",
            BlendStatus::Infeasible => "INFEASIBLE",
            BlendStatus::Unbounded => "UNBOUNDED",
            BlendStatus::Timeout => "TIMEOUT",
            BlendStatus::Abnormal => "ABNORMAL",
            BlendStatus::OutOfStock => "OUT_OF_STOCK",
            BlendStatus::SolverNotFound => "SOLVER_NOT_FOUND",
        })
    }
}

/// Result of a blend request.
///
/// Produced fresh for each request and never modified after being returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendResult {
    /// Whether the result carries a usable blend
    pub feasible: bool,

    /// Status of the final attempt
    pub status: BlendStatus,

    /// Batch id -> share of the output (included batches sum to 1.0)
    pub composition: FxHashMap<String, f64>,

    /// Batch id -> absolute weight in the output
    pub weight_distribution: FxHashMap<String, f64>,

    /// Blend attributes recomputed from the composition
    pub predicted: AttributeProfile,

    /// Sensory similarity to the target (0-100)
    pub similarity_score: f64,

    /// Scaled objective value reported by the solver
    pub objective_value: f64,

    /// Wall-clock time spent on the request
    pub elapsed: Duration,

    /// Number of relaxation retries performed
    pub retry_count: u32,

    /// Human-readable record of every relaxation applied
    pub relaxation_trace: String,

    /// Whether the relaxation loop ran out of retries
    pub exhausted: bool,
}

impl BlendResult {
    /// A non-feasible result with no blend.
    pub fn unsolved(status: BlendStatus) -> Self {
        Self {
            feasible: false,
            status,
            composition: FxHashMap::default(),
            weight_distribution: FxHashMap::default(),
            predicted: AttributeProfile::default(),
            similarity_score: 0.0,
            objective_value: 0.0,
            elapsed: Duration::ZERO,
            retry_count: 0,
            relaxation_trace: String::new(),
            exhausted: false,
        }
    }

    /// Status with the relaxation annotation, e.g. `INFEASIBLE (Relaxed 3 times)`.
    pub fn status_label(&self) -> String {
        if self.exhausted {
            format!("{} (Relaxed {} times)", self.status, self.retry_count)
        } else {
            self.status.to_string()
        }
    }

    /// Composition sorted by descending share, ties broken by batch id.
    pub fn sorted_composition(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self
            .composition
            .iter()
            .map(|(id, share)| (id.as_str(), *share))
            .collect();

        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_optimal_and_feasible_are_feasible() {
        assert!(BlendStatus::Optimal.is_feasible());
        assert!(BlendStatus::Feasible.is_feasible());
        assert!(!BlendStatus::Timeout.is_feasible());
        assert!(!BlendStatus::OutOfStock.is_feasible());
    }

    #[test]
    fn stock_and_solver_failures_are_terminal() {
        assert!(!BlendStatus::OutOfStock.is_retryable());
        assert!(!BlendStatus::SolverNotFound.is_retryable());
        assert!(BlendStatus::Infeasible.is_retryable());
        assert!(BlendStatus::Timeout.is_retryable());
    }

    #[test]
    fn status_label_carries_relaxation_suffix_once_exhausted() {
        let mut result = BlendResult::unsolved(BlendStatus::Infeasible);
        assert_eq!(result.status_label(), "INFEASIBLE");

        result.retry_count = 3;
        result.exhausted = true;
        assert_eq!(result.status_label(), "INFEASIBLE (Relaxed 3 times)");
    }

    #[test]
    fn sorted_composition_orders_by_share() {
        let mut result = BlendResult::unsolved(BlendStatus::Optimal);
        result.composition.insert("B".to_string(), 0.25);
        result.composition.insert("A".to_string(), 0.5);
        result.composition.insert("C".to_string(), 0.25);

        let ids: Vec<&str> = result
            .sorted_composition()
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        assert_eq!(ids, ["A", "B", "C"]);
    }
}
