// Solver adapters module

pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_backend;
pub mod linear_program;
pub mod microlp_backend;
pub mod outer_approximation;
pub mod reformulation;

pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_backend::HighsBackend;
pub use linear_program::{LinearProgram, MilpBackend, MilpOutcome};
pub use microlp_backend::MicroLpBackend;
pub use outer_approximation::OuterApproximationSolver;
pub use reformulation::Reformulation;
