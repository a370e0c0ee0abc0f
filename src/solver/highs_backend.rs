// HiGHS MILP backend
// Translates a LinearProgram to the HiGHS row-wise API

use crate::domain::{
    solver_service::{Result, SolverError},
    value_objects::{SolutionStatus, VariableType},
};
use highs::{HighsModelStatus, RowProblem, Sense};

use super::linear_program::{LinearProgram, MilpBackend, MilpOutcome, INCUMBENT_TOLERANCE};

pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MilpBackend for HighsBackend {
    fn name(&self) -> &str {
        "HiGHS"
    }

    // The highs bindings expose no way to pass a starting point
    fn maximize(
        &self,
        program: &LinearProgram,
        time_limit: Option<f64>,
        _warm_start: Option<&[f64]>,
    ) -> Result<MilpOutcome> {
        let mut objective = vec![0.0; program.columns.len()];
        for &(column, coeff) in &program.objective {
            objective[column] += coeff;
        }

        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(program.columns.len());

        for (column, &obj_coeff) in program.columns.iter().zip(&objective) {
            let bounds = column.lower..=column.upper;
            let col = match column.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, bounds)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, bounds),
            };
            cols.push(col);
        }

        for row in &program.rows {
            let terms: Vec<_> = row
                .terms
                .iter()
                .map(|&(column, coeff)| (cols[column], coeff))
                .collect();
            pb.add_row(row.lower..=row.upper, &terms);
        }

        let mut model = pb.optimise(Sense::Maximise);
        model.make_quiet();
        if let Some(limit) = time_limit {
            model.set_option("time_limit", limit.max(0.0));
        }

        let solved = model.solve();

        match solved.status() {
            HighsModelStatus::Optimal => Ok(MilpOutcome {
                status: SolutionStatus::Optimal,
                values: solved.get_solution().columns().to_vec(),
            }),
            HighsModelStatus::Infeasible => {
                Ok(MilpOutcome::without_values(SolutionStatus::Infeasible))
            }
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(MilpOutcome::without_values(SolutionStatus::Unbounded))
            }
            HighsModelStatus::ReachedTimeLimit => {
                // HiGHS reports columns even without an incumbent
                let values = solved.get_solution().columns().to_vec();
                if program.is_satisfied(&values, INCUMBENT_TOLERANCE) {
                    Ok(MilpOutcome {
                        status: SolutionStatus::TimeLimit,
                        values,
                    })
                } else {
                    Ok(MilpOutcome::without_values(SolutionStatus::TimeLimit))
                }
            }
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }
}
