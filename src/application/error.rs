// Errors surfaced by an optimization call

use crate::domain::solver_service::SolverError;

/// Error types for the damage optimizer
///
/// Running out of time is not an error: a time-limited solve with an
/// incumbent is reported with `is_optimized == false`.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Model is infeasible: {0}")]
    InfeasibleModel(String),

    #[error("No feasible solution found within {seconds} seconds")]
    NoSolutionWithinBudget { seconds: f64 },

    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Solver error: {0}")]
    Solver(SolverError),

    #[error("Optimization worker failed: {0}")]
    Worker(String),
}

impl From<SolverError> for OptimizeError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::SolverNotAvailable(message) => OptimizeError::SolverUnavailable(message),
            other => OptimizeError::Solver(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
