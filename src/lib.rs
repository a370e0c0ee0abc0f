// Domain layer: algebraic model, catalog, profile and solver contract
pub mod domain;

// Application layer: model builder, stat aggregation, objective and optimizer
pub mod application;

// Infrastructure layer: configuration and logging
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, EquipmentClass, Expr, Model, ObjectiveFunction, OptimizationType,
    PlayerProfile, ProfileSnapshot, Rarity, ReforgeCatalog, ReforgeDefinition, Solution,
    SolutionStatus, SolverBackend, SolverError, SolverService, Stat, VarId, Variable,
    VariableType,
};

pub use application::{
    DamageOptimizer, OptimizationReport, OptimizeError, OptimizeOptions, StatSummary,
};

pub use infrastructure::{init_tracing, OptimizerConfig};

pub use solver::{OuterApproximationSolver, SolverFactory};
