// Domain service interface for solving optimization models
// Defines the contract that any solver implementation must follow (Dependency Inversion Principle)

use std::collections::{BTreeSet, HashSet};

use super::expression::VarId;
use super::models::{Model, Solution};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Model shape not supported by this solver: {0}")]
    UnsupportedModel(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// Implementations accept integer/continuous variables, defining equations,
/// constraints, one nonlinear objective and the time budget carried in
/// `model.solver_config`. A solve that runs out of time still returns its
/// best incumbent with status `TimeLimit`; crashes and configuration errors
/// are reported as `Err`.
pub trait SolverService: Send + Sync {
    /// Solve an optimization model
    fn solve(&self, model: &Model) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &Model) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = model.num_variables();

        if model.objective().is_none() {
            errors.push("Model has no objective".to_string());
        }

        let in_range = |ids: BTreeSet<VarId>| ids.into_iter().all(|id| id.index() < num_vars);

        if let Some(objective) = model.objective() {
            if !in_range(objective.expression.variables()) {
                errors.push("Objective references an unknown variable".to_string());
            }
        }

        let mut defined = HashSet::new();
        for definition in model.definitions() {
            if definition.variable.index() >= num_vars {
                errors.push(format!(
                    "Definition '{}' targets an unknown variable",
                    definition.name
                ));
            } else if !defined.insert(definition.variable) {
                errors.push(format!(
                    "Variable {} is defined more than once",
                    model.variables()[definition.variable.index()].name
                ));
            }
            if !in_range(definition.value.variables()) {
                errors.push(format!(
                    "Definition '{}' references an unknown variable",
                    definition.name
                ));
            }
        }

        for (i, constraint) in model.constraints().iter().enumerate() {
            if !in_range(constraint.expression.variables()) {
                errors.push(format!(
                    "Constraint {} '{}' references an unknown variable",
                    i, constraint.name
                ));
            }
        }

        // Check variable bounds
        for (i, var) in model.variables().iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, Expr, ObjectiveFunction, VarId, Variable};

    struct NeverSolves;

    impl SolverService for NeverSolves {
        fn solve(&self, _model: &Model) -> Result<Solution> {
            Err(SolverError::ExecutionFailed("not implemented".into()))
        }

        fn name(&self) -> &str {
            "never"
        }
    }

    #[test]
    fn validate_rejects_missing_objective() {
        let mut model = Model::new("empty");
        model.add_variable(Variable::integer("x"));
        let err = NeverSolves.validate(&model).unwrap_err();
        assert!(err.to_string().contains("no objective"));
    }

    #[test]
    fn validate_rejects_unknown_variables_and_double_definitions() {
        let mut model = Model::new("broken");
        let x = model.add_variable(Variable::free("x"));
        model.define("x1", x, Expr::constant(1.0));
        model.define("x2", x, Expr::constant(2.0));
        model.add_constraint(Constraint::leq(Expr::var(VarId(7)), 1.0).with_name("ghost"));
        model.set_objective(ObjectiveFunction::maximize(Expr::var(x)));

        let message = NeverSolves.validate(&model).unwrap_err().to_string();
        assert!(message.contains("defined more than once"));
        assert!(message.contains("'ghost'"));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut model = Model::new("bounds");
        let x = model.add_variable(Variable::integer("x").with_bounds(3.0, Some(1.0)));
        model.set_objective(ObjectiveFunction::maximize(Expr::var(x)));
        assert!(NeverSolves.validate(&model).is_err());
    }
}
