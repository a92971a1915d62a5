//! MILP State

use std::fmt;

use good_lp::{
    Constraint, Expression, ProblemVariables, Solution, Variable, VariableDefinition, constraint,
};

/// Relation operator for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintRelation {
    /// Equality (`lhs == rhs`)
    Eq,

    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

impl fmt::Display for ConstraintRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintRelation::Eq => "=",
            ConstraintRelation::Leq => "<=",
            ConstraintRelation::Geq => ">=",
        })
    }
}

/// Recorded linear constraint emitted during model construction.
#[derive(Debug, Clone)]
pub struct MilpConstraint {
    /// Constraint name, for diagnostics
    name: String,

    /// Left-hand side expression
    lhs: Expression,

    /// Relation operator
    relation: ConstraintRelation,

    /// Right-hand side scalar
    rhs: f64,
}

impl MilpConstraint {
    /// Constraint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Left-hand side expression.
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    /// Relation operator.
    pub fn relation(&self) -> ConstraintRelation {
        self.relation
    }

    /// Right-hand side scalar.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Whether `solution` satisfies the constraint within `tolerance`.
    pub fn is_satisfied_by(&self, solution: &impl Solution, tolerance: f64) -> bool {
        let lhs = solution.eval(&self.lhs);

        match self.relation {
            ConstraintRelation::Eq => (lhs - self.rhs).abs() <= tolerance,
            ConstraintRelation::Leq => lhs <= self.rhs + tolerance,
            ConstraintRelation::Geq => lhs >= self.rhs - tolerance,
        }
    }

    /// Convert into a `good_lp` constraint.
    pub fn to_constraint(&self) -> Constraint {
        let lhs = self.lhs.clone();

        match self.relation {
            ConstraintRelation::Eq => constraint::eq(lhs, self.rhs),
            ConstraintRelation::Leq => constraint::leq(lhs, self.rhs),
            ConstraintRelation::Geq => constraint::geq(lhs, self.rhs),
        }
    }
}

/// Builder state for MILP problem variables, objective and constraints
pub struct MilpState {
    pb: ProblemVariables,
    objective: Expression,
    variables: Vec<Variable>,
    constraints: Vec<MilpConstraint>,
}

impl fmt::Debug for MilpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilpState")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field(
                "variables",
                &format!("[{} variables]", self.variables.len()),
            )
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl Default for MilpState {
    fn default() -> Self {
        Self::new()
    }
}

impl MilpState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            objective: Expression::default(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a decision variable to the problem.
    pub fn add_variable(&mut self, definition: VariableDefinition) -> Variable {
        let var = self.pb.add(definition);

        self.variables.push(var);

        var
    }

    /// Add a term to the objective function.
    pub fn add_to_objective(&mut self, var: Variable, coefficient: f64) {
        self.objective += var * coefficient;
    }

    /// Record an equality constraint.
    pub fn add_eq_constraint(&mut self, name: impl Into<String>, lhs: Expression, rhs: f64) {
        self.push_constraint(name.into(), lhs, ConstraintRelation::Eq, rhs);
    }

    /// Record a less-than-or-equal constraint.
    pub fn add_leq_constraint(&mut self, name: impl Into<String>, lhs: Expression, rhs: f64) {
        self.push_constraint(name.into(), lhs, ConstraintRelation::Leq, rhs);
    }

    /// Record a greater-than-or-equal constraint.
    pub fn add_geq_constraint(&mut self, name: impl Into<String>, lhs: Expression, rhs: f64) {
        self.push_constraint(name.into(), lhs, ConstraintRelation::Geq, rhs);
    }

    fn push_constraint(
        &mut self,
        name: String,
        lhs: Expression,
        relation: ConstraintRelation,
        rhs: f64,
    ) {
        self.constraints.push(MilpConstraint {
            name,
            lhs,
            relation,
            rhs,
        });
    }

    /// Objective expression built so far.
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    /// Constraints recorded so far.
    pub fn constraints(&self) -> &[MilpConstraint] {
        &self.constraints
    }

    /// Number of variables added so far.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Finish construction.
    pub fn into_formulation(self) -> Formulation {
        Formulation {
            pb: self.pb,
            objective: self.objective,
            variables: self.variables,
            constraints: self.constraints,
        }
    }
}

/// A complete minimisation problem, ready to hand to a backend.
pub struct Formulation {
    pb: ProblemVariables,
    objective: Expression,
    variables: Vec<Variable>,
    constraints: Vec<MilpConstraint>,
}

impl fmt::Debug for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formulation")
            .field(
                "variables",
                &format!("[{} variables]", self.variables.len()),
            )
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish_non_exhaustive()
    }
}

impl Formulation {
    /// Objective expression to minimise.
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    /// Every variable in the problem, in creation order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Every constraint in the problem.
    pub fn constraints(&self) -> &[MilpConstraint] {
        &self.constraints
    }

    /// Extract the problem variables, objective, variable list and constraints.
    pub fn into_parts(
        self,
    ) -> (
        ProblemVariables,
        Expression,
        Vec<Variable>,
        Vec<MilpConstraint>,
    ) {
        (self.pb, self.objective, self.variables, self.constraints)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use good_lp::variable;

    use super::*;

    #[test]
    fn debug_includes_counts() {
        let mut state = MilpState::new();
        let x = state.add_variable(variable().min(0).max(1));
        state.add_eq_constraint("sum", Expression::from(x), 1.0);

        let formatted = format!("{state:?}");

        assert!(formatted.contains("MilpState"));
        assert!(formatted.contains("1 variables"));
        assert!(formatted.contains("1 constraints"));
    }

    #[test]
    fn recorded_constraints_check_solutions() {
        let mut state = MilpState::new();
        let x = state.add_variable(variable().min(0).max(1));
        let y = state.add_variable(variable().binary());

        state.add_leq_constraint("link", x - y, 0.0);
        state.add_geq_constraint("floor", x - 0.2 * y, 0.0);

        let solution: HashMap<Variable, f64> = [(x, 0.5), (y, 1.0)].into_iter().collect();
        let broken: HashMap<Variable, f64> = [(x, 0.5), (y, 0.0)].into_iter().collect();

        let formulation = state.into_formulation();

        assert!(
            formulation
                .constraints()
                .iter()
                .all(|c| c.is_satisfied_by(&solution, 1e-9))
        );
        assert!(
            !formulation
                .constraints()
                .iter()
                .all(|c| c.is_satisfied_by(&broken, 1e-9))
        );
    }

    #[test]
    fn objective_accumulates_terms() {
        let mut state = MilpState::new();
        let x = state.add_variable(variable().min(0));

        state.add_to_objective(x, 2.0);
        state.add_to_objective(x, 0.5);

        let solution: HashMap<Variable, f64> = [(x, 2.0)].into_iter().collect();

        assert!((solution.eval(state.objective()) - 5.0).abs() < f64::EPSILON);
    }
}
