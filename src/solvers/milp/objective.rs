//! Objective Composer
//!
//! The objective minimised by the solver is
//!
//! ```text
//! SCALE · ( Σ_i x_i · (price_i + daysToExpiry_i · expiryPenalty)
//!         + Σ_a (d+_a + d-_a) · flavorPenalty · weight_a )
//! ```
//!
//! The expiry term is a shadow cost: older batches look cheaper, which biases the blend towards
//! first-expired-first-out depletion.

use good_lp::Variable;

use crate::{
    batches::Batch,
    params::OptimizerParams,
    solvers::milp::{DeviationPair, observer::ModelObserver, state::MilpState},
};

/// Factor applied to every objective coefficient, keeping currency-sized numbers small.
pub const OBJECTIVE_SCALE: f64 = 1e-3;

/// Unscaled per-share cost of using a batch: its price plus the expiry shadow cost.
pub fn shadow_cost(batch: &Batch, params: &OptimizerParams) -> f64 {
    batch.attributes.price + f64::from(batch.days_to_expiry) * params.expiry_penalty_per_day
}

/// Unscaled penalty per unit of deviation for a deviation pair.
///
/// Price pairs weigh nothing; they exist only to record the price gap.
pub fn deviation_coefficient(pair: &DeviationPair, params: &OptimizerParams) -> f64 {
    params.flavor_penalty_per_unit * params.weights.weight(pair.attribute)
}

/// Add every batch and deviation term to the objective.
pub fn compose(
    state: &mut MilpState,
    batches: &[&Batch],
    fractions: &[Variable],
    deviations: &[DeviationPair],
    params: &OptimizerParams,
    observer: &mut dyn ModelObserver,
) {
    for (batch, &x) in batches.iter().zip(fractions) {
        add_term(state, observer, x, shadow_cost(batch, params) * OBJECTIVE_SCALE);
    }

    for pair in deviations {
        let coefficient = deviation_coefficient(pair, params) * OBJECTIVE_SCALE;

        if coefficient <= 0.0 {
            continue;
        }

        // Same coefficient on both halves, so only the size of the gap matters.
        add_term(state, observer, pair.plus, coefficient);
        add_term(state, observer, pair.minus, coefficient);
    }
}

fn add_term(
    state: &mut MilpState,
    observer: &mut dyn ModelObserver,
    var: Variable,
    coefficient: f64,
) {
    state.add_to_objective(var, coefficient);
    observer.on_objective_term(var, coefficient);
}
