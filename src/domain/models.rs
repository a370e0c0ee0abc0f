use super::expression::{Expr, VarId};
use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};

/// Variable of an optimization model
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    /// Non-negative continuous variable
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    /// Continuous variable over all reals
    pub fn free(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: None,
            name: name.into(),
        }
    }

    /// Non-negative integer variable
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }

    /// Whether `value` respects bounds and integrality within `tolerance`
    pub fn admits(&self, value: f64, tolerance: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if value < self.lower_bound - tolerance {
            return false;
        }
        if let Some(upper) = self.upper_bound {
            if value > upper + tolerance {
                return false;
            }
        }
        !self.is_integer() || (value - value.round()).abs() <= tolerance
    }
}

/// Defining equation `variable == value` of an auxiliary quantity
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub variable: VarId,
    pub value: Expr,
}

/// Constraint `expression (<=|==|>=) bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expression: Expr,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expression: Expr, bound: f64) -> Self {
        Self {
            constraint_type,
            expression,
            bound,
            name: String::new(),
        }
    }

    pub fn leq(expression: Expr, bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, expression, bound)
    }

    pub fn geq(expression: Expr, bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, expression, bound)
    }

    pub fn eq(expression: Expr, bound: f64) -> Self {
        Self::new(ConstraintType::Equal, expression, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// How far `values` violate the constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expression.evaluate(values);
        let excess = match self.constraint_type {
            ConstraintType::LessThanOrEqual => lhs - self.bound,
            ConstraintType::GreaterThanOrEqual => self.bound - lhs,
            ConstraintType::Equal => (lhs - self.bound).abs(),
        };
        if excess.is_nan() {
            f64::INFINITY
        } else {
            excess.max(0.0)
        }
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expression: Expr,
}

impl ObjectiveFunction {
    pub fn maximize(expression: Expr) -> Self {
        Self {
            optimization_type: OptimizationType::Maximize,
            expression,
        }
    }

    pub fn minimize(expression: Expr) -> Self {
        Self {
            optimization_type: OptimizationType::Minimize,
            expression,
        }
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock budget in seconds
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            verbose: false,
        }
    }
}

/// A broken constraint, reported by [`Model::violations`]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub amount: f64,
}

/// Complete optimization model: variables, defining equations, constraints
/// and one objective
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    variables: Vec<Variable>,
    definitions: Vec<Definition>,
    constraints: Vec<Constraint>,
    objective: Option<ObjectiveFunction>,
    pub solver_config: SolverConfig,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            definitions: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    /// Record `variable == value`
    pub fn define(&mut self, name: impl Into<String>, variable: VarId, value: Expr) {
        self.definitions.push(Definition {
            name: name.into(),
            variable,
            value,
        });
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: ObjectiveFunction) {
        self.objective = Some(objective);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn definition_of(&self, id: VarId) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.variable == id)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&ObjectiveFunction> {
        self.objective.as_ref()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len() + self.definitions.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> Option<f64> {
        self.objective
            .as_ref()
            .map(|objective| objective.expression.evaluate(values))
    }

    /// Every bound, integrality, definition or constraint broken by `values`
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        let mut out = Vec::new();

        if values.len() != self.variables.len() {
            out.push(Violation {
                name: format!(
                    "expected {} values, got {}",
                    self.variables.len(),
                    values.len()
                ),
                amount: f64::INFINITY,
            });
            return out;
        }

        for (variable, &value) in self.variables.iter().zip(values) {
            if !variable.admits(value, tolerance) {
                out.push(Violation {
                    name: format!("domain of {}", variable.name),
                    amount: f64::INFINITY,
                });
            }
        }

        for definition in &self.definitions {
            let amount = (values[definition.variable.index()] - definition.value.evaluate(values))
                .abs();
            if amount.is_nan() || amount > tolerance {
                out.push(Violation {
                    name: definition.name.clone(),
                    amount,
                });
            }
        }

        for constraint in &self.constraints {
            let amount = constraint.violation(values);
            if amount > tolerance {
                out.push(Violation {
                    name: constraint.name.clone(),
                    amount,
                });
            }
        }

        out
    }

    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        self.violations(values, tolerance).is_empty()
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    /// MILP subproblems handed to the backend
    pub milp_solves: u64,
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    /// Binary variables introduced by linearization
    pub num_binary_vars: u32,
}

/// Solution to an optimization model
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub best_bound: Option<f64>,
    pub gap: Option<f64>,
    /// One value per model variable, empty when nothing was found
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            best_bound: None,
            gap: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Whether values are available (optimal or best incumbent)
    pub fn has_values(&self) -> bool {
        !self.variable_values.is_empty()
            && matches!(
                self.status,
                SolutionStatus::Optimal
                    | SolutionStatus::Feasible
                    | SolutionStatus::TimeLimit
                    | SolutionStatus::IterationLimit
            )
    }

    pub fn value(&self, id: VarId) -> Option<f64> {
        self.variable_values.get(id.index()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> (Model, VarId, VarId) {
        let mut model = Model::new("small");
        let x = model.add_variable(Variable::integer("x").with_bounds(0.0, Some(3.0)));
        let y = model.add_variable(Variable::free("y"));
        model.define("y_def", y, 2.0 * x + 1.0);
        model.add_constraint(Constraint::leq(Expr::var(y), 6.0).with_name("y_cap"));
        model.set_objective(ObjectiveFunction::maximize(Expr::var(y)));
        (model, x, y)
    }

    #[test]
    fn feasibility_checks_definitions_and_constraints() {
        let (model, _, _) = small_model();
        assert!(model.is_feasible(&[2.0, 5.0], 1e-9));

        let broken = model.violations(&[2.0, 4.0], 1e-9);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].name, "y_def");

        let broken = model.violations(&[3.0, 7.0], 1e-9);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].name, "y_cap");
    }

    #[test]
    fn feasibility_checks_integrality_and_bounds() {
        let (model, _, _) = small_model();
        assert!(!model.is_feasible(&[1.5, 4.0], 1e-9));
        assert!(!model.is_feasible(&[4.0, 9.0], 1e-9));
        assert!(!model.is_feasible(&[1.0], 1e-9));
    }

    #[test]
    fn model_lookup_and_counts() {
        let (model, x, y) = small_model();
        assert_eq!(model.find_variable("x"), Some(x));
        assert_eq!(model.definition_of(y).map(|d| d.name.as_str()), Some("y_def"));
        assert!(model.definition_of(x).is_none());
        assert_eq!(model.num_constraints(), 2);
        assert!(model.is_mixed_integer());
        assert_eq!(model.evaluate_objective(&[1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn binary_variables_admit_zero_and_one() {
        let b = Variable::binary("b");
        assert!(b.is_integer());
        assert!(b.admits(0.0, 1e-9) && b.admits(1.0, 1e-9));
        assert!(!b.admits(0.5, 1e-9));
        assert!(!b.admits(2.0, 1e-9));
    }

    #[test]
    fn constraint_violation_amounts() {
        let c = Constraint::geq(Expr::var(VarId(0)), 99.5);
        assert_eq!(c.violation(&[100.0]), 0.0);
        assert!((c.violation(&[99.0]) - 0.5).abs() < 1e-12);
        let c = Constraint::eq(Expr::var(VarId(0)), 2.0);
        assert_eq!(c.violation(&[1.0]), 1.0);
    }
}
