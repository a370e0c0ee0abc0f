#[cfg(not(feature = "highs"))]
use crate::domain::solver_service::SolverError;
use crate::domain::{
    models::Model,
    solver_service::{Result, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "highs")]
use crate::solver::HighsBackend;
use crate::solver::{MicroLpBackend, OuterApproximationSolver};
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for the backend requested by the model
    pub fn create_solver(model: &Model) -> Result<Arc<dyn SolverService>> {
        Self::create_from_backend(model.solver_config.backend)
    }

    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Ok(Self::default_solver()),
            SolverBackend::MicroLp => Ok(Arc::new(OuterApproximationSolver::new(
                MicroLpBackend::new(),
            ))),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => Ok(Arc::new(OuterApproximationSolver::new(
                HighsBackend::new(),
            ))),
            #[cfg(not(feature = "highs"))]
            SolverBackend::Highs => Err(SolverError::SolverNotAvailable(
                "HiGHS support was not compiled in (enable the `highs` feature)".to_string(),
            )),
        }
    }

    /// HiGHS when compiled in, microlp otherwise
    pub fn default_solver() -> Arc<dyn SolverService> {
        #[cfg(feature = "highs")]
        {
            Arc::new(OuterApproximationSolver::new(HighsBackend::new()))
        }
        #[cfg(not(feature = "highs"))]
        {
            Arc::new(OuterApproximationSolver::new(MicroLpBackend::new()))
        }
    }
}
