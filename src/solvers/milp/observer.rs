//! MILP Observer

use good_lp::{Expression, Variable};

use crate::{
    attributes::Attribute,
    solvers::milp::{DeviationPair, state::ConstraintRelation},
};

/// Observer trait for capturing the blend formulation as it's built.
///
/// The model builder remains the only place the formulation is constructed; observers
/// passively record what happens for diagnostics, rendering or tests.
pub trait ModelObserver {
    /// Called when the share variable for a batch is created.
    ///
    /// # Parameters
    ///
    /// - `batch_id`: Identifier of the batch
    /// - `var`: The continuous share variable
    /// - `upper_bound`: Largest share the batch's stock allows
    fn on_fraction_variable(&mut self, batch_id: &str, var: Variable, upper_bound: f64);

    /// Called when the binary selection indicator for a batch is created.
    fn on_selection_variable(&mut self, batch_id: &str, var: Variable);

    /// Called when a deviation pair is created for a tracked attribute.
    ///
    /// `hard_bound` is the upper bound placed on both halves of the pair, if any.
    fn on_deviation_pair(&mut self, pair: DeviationPair, hard_bound: Option<f64>);

    /// Called when a constraint is recorded.
    fn on_constraint(
        &mut self,
        name: &str,
        lhs: &Expression,
        relation: ConstraintRelation,
        rhs: f64,
    );

    /// Called when a term is added to the objective function.
    ///
    /// `coefficient` is already scaled.
    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {}

    /// Called when a solve attempt starts, with the attempt number (zero-based).
    fn on_attempt_begin(&mut self, _attempt: u32) {}
}

/// No-op observer for unobserved solves.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ModelObserver for NoopObserver {
    fn on_fraction_variable(&mut self, _: &str, _: Variable, _: f64) {}

    fn on_selection_variable(&mut self, _: &str, _: Variable) {}

    fn on_deviation_pair(&mut self, _: DeviationPair, _: Option<f64>) {}

    fn on_constraint(&mut self, _: &str, _: &Expression, _: ConstraintRelation, _: f64) {}
}

/// Observer that counts what was built, used for debug logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FormulationSummary {
    /// Share variables created
    pub fractions: usize,

    /// Selection indicators created
    pub selections: usize,

    /// Deviation pairs created
    pub deviation_pairs: usize,

    /// Deviation pairs with a hard bound
    pub hard_bounded_pairs: usize,

    /// Constraints recorded
    pub constraints: usize,
}

impl ModelObserver for FormulationSummary {
    fn on_fraction_variable(&mut self, _: &str, _: Variable, _: f64) {
        self.fractions += 1;
    }

    fn on_selection_variable(&mut self, _: &str, _: Variable) {
        self.selections += 1;
    }

    fn on_deviation_pair(&mut self, _: DeviationPair, hard_bound: Option<f64>) {
        self.deviation_pairs += 1;

        if hard_bound.is_some() {
            self.hard_bounded_pairs += 1;
        }
    }

    fn on_constraint(&mut self, _: &str, _: &Expression, _: ConstraintRelation, _: f64) {
        self.constraints += 1;
    }
}

/// Forwards every callback to two observers.
pub(crate) struct Tee<'a> {
    pub(crate) first: &'a mut dyn ModelObserver,
    pub(crate) second: &'a mut dyn ModelObserver,
}

impl std::fmt::Debug for Tee<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Tee")
    }
}

impl ModelObserver for Tee<'_> {
    fn on_fraction_variable(&mut self, batch_id: &str, var: Variable, upper_bound: f64) {
        self.first.on_fraction_variable(batch_id, var, upper_bound);
        self.second.on_fraction_variable(batch_id, var, upper_bound);
    }

    fn on_selection_variable(&mut self, batch_id: &str, var: Variable) {
        self.first.on_selection_variable(batch_id, var);
        self.second.on_selection_variable(batch_id, var);
    }

    fn on_deviation_pair(&mut self, pair: DeviationPair, hard_bound: Option<f64>) {
        self.first.on_deviation_pair(pair, hard_bound);
        self.second.on_deviation_pair(pair, hard_bound);
    }

    fn on_constraint(
        &mut self,
        name: &str,
        lhs: &Expression,
        relation: ConstraintRelation,
        rhs: f64,
    ) {
        self.first.on_constraint(name, lhs, relation, rhs);
        self.second.on_constraint(name, lhs, relation, rhs);
    }

    fn on_objective_term(&mut self, var: Variable, coefficient: f64) {
        self.first.on_objective_term(var, coefficient);
        self.second.on_objective_term(var, coefficient);
    }

    fn on_attempt_begin(&mut self, attempt: u32) {
        self.first.on_attempt_begin(attempt);
        self.second.on_attempt_begin(attempt);
    }
}

/// Attribute-keyed view of the hard bounds an observer saw, for tests and diagnostics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviationBounds(pub Vec<(Attribute, Option<f64>)>);

impl DeviationBounds {
    /// Hard bound recorded for an attribute, if the attribute was modelled.
    pub fn bound(&self, attribute: Attribute) -> Option<Option<f64>> {
        self.0
            .iter()
            .find(|(recorded, _)| *recorded == attribute)
            .map(|(_, bound)| *bound)
    }
}

impl ModelObserver for DeviationBounds {
    fn on_fraction_variable(&mut self, _: &str, _: Variable, _: f64) {}

    fn on_selection_variable(&mut self, _: &str, _: Variable) {}

    fn on_deviation_pair(&mut self, pair: DeviationPair, hard_bound: Option<f64>) {
        self.0.push((pair.attribute, hard_bound));
    }

    fn on_constraint(&mut self, _: &str, _: &Expression, _: ConstraintRelation, _: f64) {}

    fn on_attempt_begin(&mut self, _: u32) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use good_lp::{ProblemVariables, variable};

    use super::*;

    #[test]
    fn summary_counts_callbacks() {
        let mut pb = ProblemVariables::new();
        let x = pb.add(variable().min(0));
        let plus = pb.add(variable().min(0));
        let minus = pb.add(variable().min(0));

        let mut summary = FormulationSummary::default();
        let observer: &mut dyn ModelObserver = &mut summary;

        observer.on_fraction_variable("B01", x, 1.0);
        observer.on_deviation_pair(
            DeviationPair {
                attribute: Attribute::Caffeine,
                plus,
                minus,
            },
            Some(0.5),
        );
        observer.on_constraint(
            "sum",
            &Expression::from(x),
            ConstraintRelation::Eq,
            1.0,
        );
        observer.on_objective_term(x, 0.1);

        assert_eq!(summary.fractions, 1);
        assert_eq!(summary.deviation_pairs, 1);
        assert_eq!(summary.hard_bounded_pairs, 1);
        assert_eq!(summary.constraints, 1);
    }

    #[test]
    fn deviation_bounds_reset_per_attempt() {
        let mut pb = ProblemVariables::new();
        let pair = DeviationPair {
            attribute: Attribute::Acid,
            plus: pb.add(variable().min(0)),
            minus: pb.add(variable().min(0)),
        };

        let mut bounds = DeviationBounds::default();
        bounds.on_deviation_pair(pair, Some(1.5));
        bounds.on_attempt_begin(1);
        bounds.on_deviation_pair(pair, Some(2.5));

        assert_eq!(bounds.bound(Attribute::Acid), Some(Some(2.5)));
        assert_eq!(bounds.bound(Attribute::Sweet), None);
    }
}
