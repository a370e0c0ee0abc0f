// Outer-approximation adapter
// Implements the SolverService interface for models whose objective is a
// product of positive factors. The logarithm of the objective is concave in
// the linearized columns, so tangent cuts on each log-factor give an upper
// bound that a MILP backend tightens round by round.

use std::time::Instant;

use tracing::{debug, info};

use crate::domain::{
    models::{Model, Solution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{SolutionStatus, VariableType},
};

use super::linear_program::{Affine, LinearProgram, MilpBackend};
use super::reformulation::Reformulation;

const DEFAULT_GAP_TOLERANCE: f64 = 1e-6;
const DEFAULT_MAX_ROUNDS: usize = 500;

/// Points where every log-factor gets a tangent before the first round
const SEED_POINTS: [f64; 9] = [0.1, 1.0, 3.0, 10.0, 30.0, 100.0, 1e3, 1e4, 1e6];

pub struct OuterApproximationSolver<B: MilpBackend> {
    backend: B,
    max_rounds: usize,
}

impl<B: MilpBackend> OuterApproximationSolver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }
}

/// Best point found so far, in column space
struct Incumbent {
    log_value: f64,
    columns: Vec<f64>,
}

/// `t <= ln p + (factor - p) / p`
fn add_tangent(program: &mut LinearProgram, factor: &Affine, epigraph: usize, point: f64) {
    let mut cut = Affine::column(epigraph);
    cut.add_scaled(factor, -1.0 / point);
    program.add_affine_row(&cut, f64::NEG_INFINITY, point.ln() - 1.0);
}

/// The incumbent with each log-factor lifted onto its logarithm, which every
/// tangent cut admits
fn warm_start_point(best: &Incumbent, factors: &[Affine], epigraph: &[usize]) -> Vec<f64> {
    let mut point = best.columns.clone();
    for (factor, &t) in factors.iter().zip(epigraph) {
        let value = factor.evaluate(&best.columns);
        point[t] = if value > 0.0 { value.ln() } else { f64::NAN };
    }
    point
}

fn round_integer_columns(program: &LinearProgram, values: &mut [f64]) {
    for (column, value) in program.columns.iter().zip(values.iter_mut()) {
        if column.variable_type != VariableType::Continuous {
            *value = value.round();
        }
    }
}

impl<B: MilpBackend> SolverService for OuterApproximationSolver<B> {
    fn solve(&self, model: &Model) -> Result<Solution> {
        self.validate(model)?;

        let start_time = Instant::now();
        let config = &model.solver_config;
        let tolerance = config.gap_tolerance.unwrap_or(DEFAULT_GAP_TOLERANCE);

        let reform = Reformulation::new(model)?;
        let mut program = reform.program.clone();

        let epigraph: Vec<usize> = (0..reform.factors.len())
            .map(|i| {
                program.add_column(
                    format!("log_factor{}", i),
                    VariableType::Continuous,
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                )
            })
            .collect();
        program.objective = epigraph.iter().map(|&column| (column, 1.0)).collect();
        for (factor, &t) in reform.factors.iter().zip(&epigraph) {
            for point in SEED_POINTS {
                add_tangent(&mut program, factor, t, point);
            }
        }

        debug!(
            model = %model.name,
            backend = self.backend.name(),
            columns = program.columns.len(),
            rows = program.rows.len(),
            factors = reform.factors.len(),
            "reformulated model"
        );

        let mut incumbent: Option<Incumbent> = None;
        let mut bound = f64::INFINITY;
        let mut rounds: u64 = 0;

        let status = loop {
            let remaining = config
                .time_limit
                .map(|limit| (limit - start_time.elapsed().as_secs_f64()).max(0.0));
            let warm_start = incumbent
                .as_ref()
                .map(|best| warm_start_point(best, &reform.factors, &epigraph));
            let outcome = self
                .backend
                .maximize(&program, remaining, warm_start.as_deref())?;
            rounds += 1;

            if outcome.values.is_empty() {
                match outcome.status {
                    // Tangent cuts never cut off a point, so only the first round can fail
                    SolutionStatus::Infeasible | SolutionStatus::Unbounded
                        if incumbent.is_none() =>
                    {
                        break outcome.status
                    }
                    SolutionStatus::TimeLimit => break SolutionStatus::TimeLimit,
                    status => {
                        return Err(SolverError::ExecutionFailed(format!(
                            "{} returned {} in round {}",
                            self.backend.name(),
                            status,
                            rounds
                        )))
                    }
                }
            }

            if outcome.status == SolutionStatus::Optimal {
                bound = bound.min(program.objective_value(&outcome.values));
            }

            let mut columns = outcome.values;
            round_integer_columns(&program, &mut columns);
            let values = reform.model_values(model, &columns);
            let log_value = match model.evaluate_objective(&values) {
                Some(value) if value > 0.0 && reform.scalar > 0.0 => (value / reform.scalar).ln(),
                Some(_) if reform.factors.is_empty() => 0.0,
                _ => f64::NEG_INFINITY,
            };

            let improved = incumbent
                .as_ref()
                .map_or(true, |best| log_value > best.log_value);
            if improved {
                debug!(round = rounds, log_value, bound, "new incumbent");
                incumbent = Some(Incumbent {
                    log_value,
                    columns: columns.clone(),
                });
            }

            if outcome.status == SolutionStatus::TimeLimit {
                break SolutionStatus::TimeLimit;
            }

            let best = incumbent
                .as_ref()
                .map_or(f64::NEG_INFINITY, |best| best.log_value);
            if bound - best <= tolerance {
                break SolutionStatus::Optimal;
            }
            if let Some(limit) = config.time_limit {
                if start_time.elapsed().as_secs_f64() >= limit {
                    break SolutionStatus::TimeLimit;
                }
            }
            if rounds as usize >= self.max_rounds {
                break SolutionStatus::IterationLimit;
            }

            for (factor, &t) in reform.factors.iter().zip(&epigraph) {
                let point = factor.evaluate(&columns);
                if point.is_finite() && point > 0.0 {
                    add_tangent(&mut program, factor, t, point);
                }
            }
        };

        let statistics = SolverStatistics {
            milp_solves: rounds,
            solve_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: model.num_integer_variables() as u32,
            num_binary_vars: program.num_binary_columns() as u32,
        };

        let Some(best) = incumbent else {
            let message = match status {
                SolutionStatus::Infeasible => {
                    "Problem is infeasible: no solution satisfies all constraints".to_string()
                }
                SolutionStatus::Unbounded => {
                    "Problem is unbounded: objective can be improved infinitely".to_string()
                }
                _ => "No feasible solution found within the time limit".to_string(),
            };
            info!(model = %model.name, %status, rounds, "solve finished without a solution");
            return Ok(Solution::new(status, message).with_statistics(statistics));
        };

        let values = reform.model_values(model, &best.columns);
        let objective = model.evaluate_objective(&values).unwrap_or(0.0);
        let best_bound = if bound.is_finite() {
            Some(reform.scalar * bound.exp())
        } else {
            None
        };
        let gap = best_bound
            .filter(|_| objective.abs() > f64::EPSILON)
            .map(|b| ((b - objective) / objective.abs()).max(0.0));

        let status = match status {
            // A point was found before running out of rounds
            SolutionStatus::IterationLimit => SolutionStatus::Feasible,
            other => other,
        };

        info!(
            model = %model.name,
            %status,
            objective,
            rounds,
            elapsed_ms = statistics.solve_time_ms,
            "solve finished"
        );

        Ok(Solution {
            status,
            optimal_value: Some(objective),
            best_bound,
            gap,
            variable_values: values,
            message: match status {
                SolutionStatus::Optimal => format!("Optimal solution found for '{}'", model.name),
                other => format!("Best solution found for '{}' ({})", model.name, other),
            },
            statistics,
        })
    }

    fn name(&self) -> &str {
        "outer-approximation"
    }
}
