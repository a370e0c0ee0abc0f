// Pure-Rust MILP backend
// Translates a LinearProgram into a good_lp model solved by microlp

use crate::domain::{
    solver_service::{Result, SolverError},
    value_objects::{SolutionStatus, VariableType},
};
use good_lp::{
    solvers::microlp::microlp, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolutionStatus as GoodLpStatus, SolverModel,
    Variable as GoodLpVariable, WithInitialSolution, WithTimeLimit,
};

use super::linear_program::{LinearProgram, MilpBackend, MilpOutcome, INCUMBENT_TOLERANCE};

/// Rows without terms are checked here instead of being handed to microlp
const EMPTY_ROW_TOLERANCE: f64 = 1e-9;

pub struct MicroLpBackend;

impl MicroLpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicroLpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MilpBackend for MicroLpBackend {
    fn name(&self) -> &str {
        "microlp"
    }

    fn maximize(
        &self,
        program: &LinearProgram,
        time_limit: Option<f64>,
        warm_start: Option<&[f64]>,
    ) -> Result<MilpOutcome> {
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(program.columns.len());

        for column in &program.columns {
            let mut definition = match column.variable_type {
                VariableType::Binary => variable().binary(),
                VariableType::Integer => variable().integer(),
                VariableType::Continuous => variable(),
            };
            if column.lower.is_finite() {
                definition = definition.min(column.lower);
            }
            if column.upper.is_finite() {
                definition = definition.max(column.upper);
            }
            lp_variables.push(vars.add(definition));
        }

        let mut objective: Expression = 0.into();
        for &(column, coeff) in &program.objective {
            objective += coeff * lp_variables[column];
        }

        let mut lp_model = vars.maximise(objective).using(microlp);
        if let Some(limit) = time_limit {
            lp_model = lp_model.with_time_limit(limit.max(0.0));
        }
        if let Some(point) = warm_start {
            // microlp drops hints that are infeasible or out of bounds
            let hint: Vec<(GoodLpVariable, f64)> = lp_variables
                .iter()
                .copied()
                .zip(point.iter().copied())
                .filter(|(_, value)| value.is_finite())
                .collect();
            lp_model = lp_model.with_initial_solution(hint);
        }

        for row in &program.rows {
            if row.terms.is_empty() {
                if row.lower > EMPTY_ROW_TOLERANCE || row.upper < -EMPTY_ROW_TOLERANCE {
                    return Ok(MilpOutcome::without_values(SolutionStatus::Infeasible));
                }
                continue;
            }

            let mut lhs: Expression = 0.into();
            for &(column, coeff) in &row.terms {
                lhs += coeff * lp_variables[column];
            }

            if row.lower == row.upper {
                lp_model = lp_model.with(lhs.eq(row.lower));
                continue;
            }
            if row.lower.is_finite() {
                lp_model = lp_model.with(lhs.clone().geq(row.lower));
            }
            if row.upper.is_finite() {
                lp_model = lp_model.with(lhs.leq(row.upper));
            }
        }

        match lp_model.solve() {
            Ok(sol) => {
                let values: Vec<f64> = lp_variables.iter().map(|&var| sol.value(var)).collect();
                match sol.status() {
                    GoodLpStatus::Optimal => Ok(MilpOutcome {
                        status: SolutionStatus::Optimal,
                        values,
                    }),
                    GoodLpStatus::TimeLimit
                        if program.is_satisfied(&values, INCUMBENT_TOLERANCE) =>
                    {
                        Ok(MilpOutcome {
                            status: SolutionStatus::TimeLimit,
                            values,
                        })
                    }
                    GoodLpStatus::TimeLimit => {
                        Ok(MilpOutcome::without_values(SolutionStatus::TimeLimit))
                    }
                    // No MIP gap is configured, so this is an unproven point
                    GoodLpStatus::GapLimit => Ok(MilpOutcome {
                        status: SolutionStatus::Feasible,
                        values,
                    }),
                }
            }
            Err(ResolutionError::Infeasible) => {
                Ok(MilpOutcome::without_values(SolutionStatus::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(MilpOutcome::without_values(SolutionStatus::Unbounded))
            }
            // Raised when the budget ran out before any integer point was found
            Err(ResolutionError::Other(message)) if message.starts_with("Time limit") => {
                Ok(MilpOutcome::without_values(SolutionStatus::TimeLimit))
            }
            Err(e) => Err(SolverError::ExecutionFailed(format!("microlp: {:?}", e))),
        }
    }
}
