// Reformulation of a nonlinear model into a MILP plus objective factors
//
// Continuous defined variables are substituted away, every product of
// variables is replaced by an exact binary-expansion linearization, and the
// objective is split into multiplicative factors that are affine in the
// resulting columns.

use std::collections::HashMap;

use crate::domain::{
    models::Model,
    solver_service::{Result, SolverError},
    ConstraintType, Expr, OptimizationType, Polynomial, VarId, VariableType,
};

use super::linear_program::{Affine, LinearProgram};

/// Lower bound imposed on every objective factor
pub const FACTOR_FLOOR: f64 = 1e-6;

/// `column == offset + Σ weight * bit`
#[derive(Debug, Clone)]
struct Expansion {
    offset: f64,
    bits: Vec<(usize, f64)>,
}

/// Linearized view of a [`Model`]
#[derive(Debug, Clone)]
pub struct Reformulation {
    pub program: LinearProgram,
    /// Positive constant multiplying the product of `factors`
    pub scalar: f64,
    pub factors: Vec<Affine>,
    /// Column of each model variable, `None` for substituted ones
    columns: Vec<Option<usize>>,
    /// Substituted variables, dependencies first
    evaluation_order: Vec<VarId>,
    expansions: HashMap<usize, Expansion>,
    products: HashMap<Vec<usize>, Affine>,
}

impl Reformulation {
    pub fn new(model: &Model) -> Result<Self> {
        let objective = model
            .objective()
            .ok_or_else(|| SolverError::InvalidProblem("Model has no objective".to_string()))?;

        // Integer-valued definitions keep their column and become equality rows
        let substitutable: HashMap<VarId, &Expr> = model
            .definitions()
            .iter()
            .filter(|d| {
                model
                    .variable(d.variable)
                    .is_some_and(|v| v.variable_type == VariableType::Continuous)
            })
            .map(|d| (d.variable, &d.value))
            .collect();
        let (resolved, evaluation_order) = resolve_definitions(&substitutable)?;
        let lookup = |id: VarId| resolved.get(&id).cloned();

        let mut reform = Self {
            program: LinearProgram::default(),
            scalar: 1.0,
            factors: Vec::new(),
            columns: vec![None; model.num_variables()],
            evaluation_order,
            expansions: HashMap::new(),
            products: HashMap::new(),
        };

        for (i, var) in model.variables().iter().enumerate() {
            if resolved.contains_key(&VarId(i)) {
                continue;
            }
            let upper = var.upper_bound.unwrap_or(f64::INFINITY);
            let column =
                reform
                    .program
                    .add_column(var.name.clone(), var.variable_type, var.lower_bound, upper);
            reform.columns[i] = Some(column);
        }

        // Bounds of substituted variables turn into rows on their expressions
        for id in reform.evaluation_order.clone() {
            let var = &model.variables()[id.index()];
            let upper = var.upper_bound.unwrap_or(f64::INFINITY);
            if var.lower_bound.is_finite() || upper.is_finite() {
                let affine = reform.linearize(&resolved[&id].to_polynomial())?;
                reform.program.add_affine_row(&affine, var.lower_bound, upper);
            }
        }

        for definition in model.definitions() {
            if resolved.contains_key(&definition.variable) {
                continue;
            }
            let expr = Expr::var(definition.variable) - definition.value.substitute(&lookup);
            let affine = reform.linearize(&expr.to_polynomial())?;
            reform.program.add_affine_row(&affine, 0.0, 0.0);
        }

        for constraint in model.constraints() {
            let expr = constraint.expression.substitute(&lookup);
            let affine = reform.linearize(&expr.to_polynomial())?;
            let (lower, upper) = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => (f64::NEG_INFINITY, constraint.bound),
                ConstraintType::GreaterThanOrEqual => (constraint.bound, f64::INFINITY),
                ConstraintType::Equal => (constraint.bound, constraint.bound),
            };
            reform.program.add_affine_row(&affine, lower, upper);
        }

        let (mut scalar, factors) = objective.expression.substitute(&lookup).factors();
        for factor in factors {
            let affine = reform.linearize(&factor.to_polynomial())?;
            if affine.terms.is_empty() {
                scalar *= affine.constant;
                continue;
            }
            reform.program.add_affine_row(&affine, FACTOR_FLOOR, f64::INFINITY);
            reform.factors.push(affine);
        }

        if !reform.factors.is_empty() {
            if objective.optimization_type != OptimizationType::Maximize {
                return Err(SolverError::UnsupportedModel(
                    "only maximization of a product of factors is supported".to_string(),
                ));
            }
            if scalar <= 0.0 {
                return Err(SolverError::UnsupportedModel(format!(
                    "objective scale must be positive, got {}",
                    scalar
                )));
            }
        }
        reform.scalar = scalar;

        Ok(reform)
    }

    /// Values of every model variable for a point of the program
    pub fn model_values(&self, model: &Model, column_values: &[f64]) -> Vec<f64> {
        let mut values = vec![0.0; model.num_variables()];

        for (i, column) in self.columns.iter().enumerate() {
            if let Some(column) = column {
                let value = column_values.get(*column).copied().unwrap_or(0.0);
                values[i] = if model.variables()[i].is_integer() {
                    value.round()
                } else {
                    value
                };
            }
        }

        for &id in &self.evaluation_order {
            if let Some(definition) = model.definition_of(id) {
                values[id.index()] = definition.value.evaluate(&values);
            }
        }

        values
    }

    pub fn num_substituted(&self) -> usize {
        self.evaluation_order.len()
    }

    fn linearize(&mut self, polynomial: &Polynomial) -> Result<Affine> {
        let mut affine = Affine::constant(polynomial.constant);

        for (monomial, &coeff) in &polynomial.terms {
            let mut columns = Vec::with_capacity(monomial.len());
            for id in monomial {
                let column = self
                    .columns
                    .get(id.index())
                    .copied()
                    .flatten()
                    .ok_or_else(|| {
                        SolverError::InvalidProblem(format!(
                            "variable {} has no column",
                            id.index()
                        ))
                    })?;
                columns.push(column);
            }
            columns.sort_unstable();
            let product = self.product(&columns)?;
            affine.add_scaled(&product, coeff);
        }

        Ok(affine.compact())
    }

    fn product(&mut self, columns: &[usize]) -> Result<Affine> {
        if columns.len() == 1 {
            return Ok(Affine::column(columns[0]));
        }
        if let Some(cached) = self.products.get(columns) {
            return Ok(cached.clone());
        }

        // Expand the bounded integer column with the narrowest range
        let pivot = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.is_expandable(**c))
            .min_by(|(_, a), (_, b)| self.range(**a).total_cmp(&self.range(**b)))
            .map(|(i, _)| i)
            .ok_or_else(|| {
                let names: Vec<_> = columns
                    .iter()
                    .map(|&c| self.program.columns[c].name.as_str())
                    .collect();
                SolverError::UnsupportedModel(format!(
                    "product {} has no bounded integer factor",
                    names.join(" * ")
                ))
            })?;

        let mut rest = columns.to_vec();
        let pivot_column = rest.remove(pivot);
        let other = self.product(&rest)?;
        let result = self.multiply(pivot_column, &other)?;

        self.products.insert(columns.to_vec(), result.clone());
        Ok(result)
    }

    fn is_expandable(&self, column: usize) -> bool {
        let column = &self.program.columns[column];
        column.variable_type != VariableType::Continuous
            && column.lower.is_finite()
            && column.upper.is_finite()
    }

    fn range(&self, column: usize) -> f64 {
        let column = &self.program.columns[column];
        column.upper - column.lower
    }

    /// Exact `x * y` for a bounded integer column `x` and a bounded affine `y`
    fn multiply(&mut self, x: usize, y: &Affine) -> Result<Affine> {
        let (y_lower, y_upper) = self.bounds(y);
        if !y_lower.is_finite() || !y_upper.is_finite() {
            return Err(SolverError::UnsupportedModel(format!(
                "factor multiplied by {} is unbounded",
                self.program.columns[x].name
            )));
        }

        let expansion = self.expansion(x);
        let mut result = Affine::default();
        result.add_scaled(y, expansion.offset);

        for (bit, weight) in expansion.bits {
            let name = format!("{}*{}", self.program.columns[bit].name, self.program.columns.len());
            let z = self.program.add_column(
                name,
                VariableType::Continuous,
                y_lower.min(0.0),
                y_upper.max(0.0),
            );

            // z == bit * y, exact because bit is binary and y is bounded
            let mut upper_by_bit = Affine::column(z);
            upper_by_bit.terms.push((bit, -y_upper));
            self.program
                .add_affine_row(&upper_by_bit, f64::NEG_INFINITY, 0.0);

            let mut lower_by_bit = Affine::column(z);
            lower_by_bit.terms.push((bit, -y_lower));
            self.program.add_affine_row(&lower_by_bit, 0.0, f64::INFINITY);

            let mut upper_by_y = Affine::column(z);
            upper_by_y.add_scaled(y, -1.0);
            upper_by_y.terms.push((bit, -y_lower));
            self.program
                .add_affine_row(&upper_by_y, f64::NEG_INFINITY, -y_lower);

            let mut lower_by_y = Affine::column(z);
            lower_by_y.add_scaled(y, -1.0);
            lower_by_y.terms.push((bit, -y_upper));
            self.program.add_affine_row(&lower_by_y, -y_upper, f64::INFINITY);

            result.terms.push((z, weight));
        }

        Ok(result.compact())
    }

    fn expansion(&mut self, x: usize) -> Expansion {
        if let Some(expansion) = self.expansions.get(&x) {
            return expansion.clone();
        }

        let name = self.program.columns[x].name.clone();
        let lower = self.program.columns[x].lower.ceil();
        let upper = self.program.columns[x].upper.floor();
        let span = (upper - lower).max(0.0);

        let mut bits = Vec::new();
        let mut weight = 1.0;
        let mut covered = 0.0;
        while covered < span {
            let bit = self.program.add_column(
                format!("{}_bit{}", name, bits.len()),
                VariableType::Binary,
                0.0,
                1.0,
            );
            bits.push((bit, weight));
            covered += weight;
            weight *= 2.0;
        }

        let mut tie = Affine::column(x);
        for &(bit, weight) in &bits {
            tie.terms.push((bit, -weight));
        }
        self.program.add_affine_row(&tie, lower, lower);

        if covered > span {
            let sum = Affine {
                constant: 0.0,
                terms: bits.clone(),
            };
            self.program.add_affine_row(&sum, f64::NEG_INFINITY, span);
        }

        let expansion = Expansion {
            offset: lower,
            bits,
        };
        self.expansions.insert(x, expansion.clone());
        expansion
    }

    fn bounds(&self, affine: &Affine) -> (f64, f64) {
        let mut lower = affine.constant;
        let mut upper = affine.constant;
        for &(column, coeff) in &affine.terms {
            let column = &self.program.columns[column];
            if coeff > 0.0 {
                lower += coeff * column.lower;
                upper += coeff * column.upper;
            } else if coeff < 0.0 {
                lower += coeff * column.upper;
                upper += coeff * column.lower;
            }
        }
        (lower, upper)
    }
}

/// Fully substitute definitions into each other, dependencies first
fn resolve_definitions(
    definitions: &HashMap<VarId, &Expr>,
) -> Result<(HashMap<VarId, Expr>, Vec<VarId>)> {
    let mut resolved: HashMap<VarId, Expr> = HashMap::new();
    let mut order = Vec::new();
    let mut pending: Vec<VarId> = definitions.keys().copied().collect();
    pending.sort();

    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();

        for id in pending {
            let value = definitions[&id];
            let ready = value
                .variables()
                .iter()
                .all(|dep| !definitions.contains_key(dep) || resolved.contains_key(dep));
            if ready {
                let expr = value.substitute(&|dep| resolved.get(&dep).cloned());
                resolved.insert(id, expr);
                order.push(id);
            } else {
                waiting.push(id);
            }
        }

        if waiting.len() == before {
            return Err(SolverError::InvalidProblem(format!(
                "circular definitions among {} variables",
                waiting.len()
            )));
        }
        pending = waiting;
    }

    Ok((resolved, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, ObjectiveFunction, Variable};

    #[test]
    fn linear_model_needs_no_binaries() {
        let mut model = Model::new("linear");
        let x = model.add_variable(Variable::integer("x").with_bounds(0.0, Some(5.0)));
        let y = model.add_variable(Variable::free("y"));
        model.define("y", y, 2.0 * x + 1.0);
        model.add_constraint(Constraint::leq(Expr::var(y), 7.0));
        model.set_objective(ObjectiveFunction::maximize(Expr::var(y)));

        let reform = Reformulation::new(&model).unwrap();
        assert_eq!(reform.program.columns.len(), 1);
        assert_eq!(reform.program.num_binary_columns(), 0);
        assert_eq!(reform.factors.len(), 1);
        assert_eq!(reform.num_substituted(), 1);
        // y <= 7 becomes 2x <= 6, plus the factor floor row
        assert_eq!(reform.program.rows.len(), 2);
        assert_eq!(reform.program.rows[0].upper, 6.0);
    }

    #[test]
    fn products_expand_the_narrowest_integer() {
        let mut model = Model::new("bilinear");
        let x = model.add_variable(Variable::integer("x").with_bounds(0.0, Some(6.0)));
        let y = model.add_variable(Variable::integer("y").with_bounds(0.0, Some(1.0)));
        model.set_objective(ObjectiveFunction::maximize(
            1.0 + Expr::var(x) * Expr::var(y),
        ));

        let reform = Reformulation::new(&model).unwrap();
        // y in [0, 1] needs one bit; x is left untouched
        assert_eq!(reform.program.num_binary_columns(), 1);
        let factor = &reform.factors[0];
        assert_eq!(factor.constant, 1.0);
        assert_eq!(factor.terms.len(), 1);
    }

    #[test]
    fn continuous_products_are_rejected() {
        let mut model = Model::new("nonconvex");
        let x = model.add_variable(Variable::continuous("x").with_bounds(0.0, Some(1.0)));
        let y = model.add_variable(Variable::continuous("y").with_bounds(0.0, Some(1.0)));
        model.set_objective(ObjectiveFunction::maximize(
            1.0 + Expr::var(x) * Expr::var(y),
        ));
        let err = Reformulation::new(&model).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedModel(_)));
    }

    #[test]
    fn minimizing_products_is_rejected() {
        let mut model = Model::new("min");
        let x = model.add_variable(Variable::integer("x").with_bounds(1.0, Some(3.0)));
        model.set_objective(ObjectiveFunction::minimize(Expr::var(x) * 2.0));
        let err = Reformulation::new(&model).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedModel(_)));
    }

    #[test]
    fn constant_factors_fold_into_scalar() {
        let mut model = Model::new("scaled");
        let x = model.add_variable(Variable::integer("x").with_bounds(0.0, Some(3.0)));
        let speed = (Expr::constant(100.0) + 100.0) / 100.0 / 0.5;
        model.set_objective(ObjectiveFunction::maximize((Expr::var(x) + 1.0) * speed));
        let reform = Reformulation::new(&model).unwrap();
        assert_eq!(reform.factors.len(), 1);
        assert!((reform.scalar - 4.0).abs() < 1e-12);
    }

    #[test]
    fn circular_definitions_are_rejected() {
        let mut model = Model::new("cycle");
        let a = model.add_variable(Variable::free("a"));
        let b = model.add_variable(Variable::free("b"));
        model.define("a", a, Expr::var(b) + 1.0);
        model.define("b", b, Expr::var(a) - 1.0);
        model.set_objective(ObjectiveFunction::maximize(Expr::var(a)));
        let err = Reformulation::new(&model).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn model_values_rebuild_definitions_in_order() {
        let mut model = Model::new("chain");
        let x = model.add_variable(Variable::integer("x").with_bounds(0.0, Some(4.0)));
        let m = model.add_variable(Variable::free("m"));
        let s = model.add_variable(Variable::free("s"));
        // s depends on m, declared in the opposite order
        model.define("s", s, Expr::var(m) * (Expr::var(x) + 10.0));
        model.define("m", m, 1.0 + 0.01 * x);
        model.set_objective(ObjectiveFunction::maximize(1.0 + Expr::var(s) / 100.0));

        let reform = Reformulation::new(&model).unwrap();
        let values = reform.model_values(&model, &[2.0000001]);
        assert_eq!(values[x.index()], 2.0);
        assert!((values[m.index()] - 1.02).abs() < 1e-12);
        assert!((values[s.index()] - 12.24).abs() < 1e-9);
        assert!(model.is_feasible(&values, 1e-9));
    }
}
