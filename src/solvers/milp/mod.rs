//! MILP Blend Model
//!
//! Turns a batch list, a target and a parameter profile into a mixed-integer linear program.
//!
//! For every retained batch `i` there is a continuous share `x_i` in `[0, min(1, stock_i / output)]`
//! and a binary selection indicator `y_i`. Structural constraints tie them together:
//!
//! - `Σ x_i = 1`
//! - `x_i - y_i <= 0`
//! - `x_i - minRatio·y_i >= 0` (only when a minimum ratio is set)
//! - `Σ y_i <= maxBatchTypes` (only when a cap is set)
//!
//! Each tracked attribute `a` gets a deviation pair and a balance equation
//! `Σ x_i·attr_i(a) - d+_a + d-_a = target_a`, which linearises `|actual_a - target_a|`.

use std::time::Duration;

use good_lp::{Expression, Variable, variable};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    attributes::Attribute,
    batches::Batch,
    params::OptimizerParams,
    result::BlendResult,
    solvers::{MilpBackend, SolverError},
    target::{BlendTarget, CAFFEINE_TOLERANCE},
};

pub mod extract;
pub mod objective;
pub mod observer;
pub mod state;

pub use observer::{DeviationBounds, FormulationSummary, ModelObserver, NoopObserver};
pub use state::{ConstraintRelation, Formulation, MilpConstraint, MilpState};

type BatchRefs<'a> = SmallVec<[&'a Batch; 16]>;
type VariableList = SmallVec<[Variable; 16]>;

/// Positive and negative deviation variables for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationPair {
    /// Attribute the pair measures
    pub attribute: Attribute,

    /// Amount by which the blend exceeds the target
    pub plus: Variable,

    /// Amount by which the blend falls short of the target
    pub minus: Variable,
}

/// A blend model ready to be solved.
#[derive(Debug)]
pub struct BlendModel<'a> {
    state: MilpState,
    batches: BatchRefs<'a>,
    fractions: VariableList,
    selections: VariableList,
    deviations: SmallVec<[DeviationPair; 5]>,
}

impl<'a> BlendModel<'a> {
    /// Build the model for one solve attempt.
    ///
    /// Batches with negligible stock are dropped before modelling.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::OutOfStock`] if no batch has usable stock.
    pub fn build(
        batches: &'a [Batch],
        target: &BlendTarget,
        params: &OptimizerParams,
        observer: &mut dyn ModelObserver,
    ) -> Result<Self, SolverError> {
        let retained: BatchRefs<'a> = batches
            .iter()
            .filter(|batch| batch.has_usable_stock())
            .collect();

        if retained.is_empty() {
            return Err(SolverError::OutOfStock);
        }

        let mut state = MilpState::new();

        let (fractions, selections) =
            add_batch_variables(&mut state, &retained, target, observer);

        add_structural_constraints(&mut state, &fractions, &selections, target, observer);
        add_price_cap(&mut state, &retained, &fractions, target, params, observer);

        let deviations =
            add_attribute_balances(&mut state, &retained, &fractions, target, params, observer);

        objective::compose(
            &mut state,
            &retained,
            &fractions,
            &deviations,
            params,
            observer,
        );

        debug!(
            retained = retained.len(),
            dropped = batches.len() - retained.len(),
            variables = state.variable_count(),
            constraints = state.constraints().len(),
            "built blend model"
        );

        Ok(Self {
            state,
            batches: retained,
            fractions,
            selections,
            deviations,
        })
    }

    /// Batches that made it into the model, in variable order.
    pub fn batches(&self) -> &[&'a Batch] {
        &self.batches
    }

    /// Share variables, one per retained batch.
    pub fn fractions(&self) -> &[Variable] {
        &self.fractions
    }

    /// Selection indicators, one per retained batch.
    pub fn selections(&self) -> &[Variable] {
        &self.selections
    }

    /// Deviation pairs, one per tracked attribute.
    pub fn deviations(&self) -> &[DeviationPair] {
        &self.deviations
    }

    /// Recorded formulation state.
    pub fn state(&self) -> &MilpState {
        &self.state
    }

    /// Hand the model to a backend and extract the result.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the backend cannot be used or the model is inconsistent.
    pub fn solve_with<B: MilpBackend + ?Sized>(
        self,
        backend: &B,
        budget: Duration,
        target: &BlendTarget,
    ) -> Result<BlendResult, SolverError> {
        if self.fractions.len() != self.batches.len() {
            return Err(SolverError::InvariantViolation {
                message: "share variable count does not match retained batch count",
            });
        }

        let Self {
            state,
            batches,
            fractions,
            ..
        } = self;

        let outcome = backend.solve(state.into_formulation(), budget)?;

        Ok(extract::extract(&outcome, &batches, &fractions, target))
    }
}

/// Create the share and selection variables for every retained batch.
fn add_batch_variables(
    state: &mut MilpState,
    batches: &[&Batch],
    target: &BlendTarget,
    observer: &mut dyn ModelObserver,
) -> (VariableList, VariableList) {
    let mut fractions = VariableList::new();
    let mut selections = VariableList::new();

    for batch in batches {
        // Bounding the share directly is cheaper for the solver than a separate
        // `x_i * output <= stock_i` row.
        let upper = batch.max_fraction(target.total_output);

        let x = state.add_variable(
            variable()
                .min(0.0)
                .max(upper)
                .name(format!("x_{}", batch.id)),
        );
        let y = state.add_variable(variable().binary().name(format!("y_{}", batch.id)));

        observer.on_fraction_variable(&batch.id, x, upper);
        observer.on_selection_variable(&batch.id, y);

        fractions.push(x);
        selections.push(y);
    }

    (fractions, selections)
}

/// Sum-to-one, selection linking, minimum ratio and cardinality constraints.
fn add_structural_constraints(
    state: &mut MilpState,
    fractions: &[Variable],
    selections: &[Variable],
    target: &BlendTarget,
    observer: &mut dyn ModelObserver,
) {
    let total: Expression = fractions.iter().copied().map(Expression::from).sum();

    observer.on_constraint("sum_one", &total, ConstraintRelation::Eq, 1.0);
    state.add_eq_constraint("sum_one", total, 1.0);

    for (idx, (&x, &y)) in fractions.iter().zip(selections).enumerate() {
        // A batch contributes only if selected.
        let link_up = x - y;

        observer.on_constraint("link_up", &link_up, ConstraintRelation::Leq, 0.0);
        state.add_leq_constraint(format!("link_up_{idx}"), link_up, 0.0);

        if target.min_ratio > 0.0 {
            // A selected batch carries at least the minimum share.
            let link_low = x - target.min_ratio * y;

            observer.on_constraint("link_low", &link_low, ConstraintRelation::Geq, 0.0);
            state.add_geq_constraint(format!("link_low_{idx}"), link_low, 0.0);
        }
    }

    if target.max_batch_types > 0 {
        let selected: Expression = selections.iter().copied().map(Expression::from).sum();
        let cap = f64::from(target.max_batch_types);

        observer.on_constraint("max_types", &selected, ConstraintRelation::Leq, cap);
        state.add_leq_constraint("max_types", selected, cap);
    }
}

/// One-sided price cap: the blend price may never exceed target + tolerance.
fn add_price_cap(
    state: &mut MilpState,
    batches: &[&Batch],
    fractions: &[Variable],
    target: &BlendTarget,
    params: &OptimizerParams,
    observer: &mut dyn ModelObserver,
) {
    let Some(price) = target.price() else {
        return;
    };

    let blend_price = weighted_sum(batches, fractions, Attribute::Price);
    let cap = price + params.price_tolerance;

    observer.on_constraint("price_limit", &blend_price, ConstraintRelation::Leq, cap);
    state.add_leq_constraint("price_limit", blend_price, cap);
}

/// Deviation pairs and balance equations for every tracked attribute.
fn add_attribute_balances(
    state: &mut MilpState,
    batches: &[&Batch],
    fractions: &[Variable],
    target: &BlendTarget,
    params: &OptimizerParams,
    observer: &mut dyn ModelObserver,
) -> SmallVec<[DeviationPair; 5]> {
    let mut deviations = SmallVec::new();

    for attribute in Attribute::ALL {
        if !target.tracks(attribute) {
            continue;
        }

        let hard_bound = deviation_bound(attribute, target, params);

        let (plus_def, minus_def) = match hard_bound {
            Some(bound) => (
                variable().min(0.0).max(bound),
                variable().min(0.0).max(bound),
            ),
            None => (variable().min(0.0), variable().min(0.0)),
        };

        let pair = DeviationPair {
            attribute,
            plus: state.add_variable(plus_def.name(format!("d_{attribute}_plus"))),
            minus: state.add_variable(minus_def.name(format!("d_{attribute}_minus"))),
        };

        observer.on_deviation_pair(pair, hard_bound);

        let balance = weighted_sum(batches, fractions, attribute) - pair.plus + pair.minus;
        let target_value = target.values.get(attribute);
        let name = format!("{attribute}_balance");

        observer.on_constraint(&name, &balance, ConstraintRelation::Eq, target_value);
        state.add_eq_constraint(name, balance, target_value);

        deviations.push(pair);
    }

    deviations
}

/// Hard upper bound on an attribute's deviation pair.
///
/// Caffeine is always capped. Other sensory attributes are capped by the flavour tolerance only
/// in price-driven mode; elsewhere the objective penalty alone controls them. Price deviation is
/// never bounded here since the price cap is a separate one-sided constraint.
pub fn deviation_bound(
    attribute: Attribute,
    target: &BlendTarget,
    params: &OptimizerParams,
) -> Option<f64> {
    match attribute {
        Attribute::Price => None,
        Attribute::Caffeine => Some(CAFFEINE_TOLERANCE),
        _ if target.mode.is_price_driven() && params.flavor_tolerance > 0.0 => {
            Some(params.flavor_tolerance)
        }
        _ => None,
    }
}

/// `Σ x_i · attr_i(a)` over the retained batches.
fn weighted_sum(batches: &[&Batch], fractions: &[Variable], attribute: Attribute) -> Expression {
    batches
        .iter()
        .zip(fractions)
        .map(|(batch, &x)| x * batch.attributes.get(attribute))
        .sum()
}
