// Application layer: reforge model construction and the optimizer use case

pub mod error;
pub mod model_builder;
pub mod objective;
pub mod optimizer;
pub mod result_formatter;
pub mod stat_aggregator;

pub use error::OptimizeError;
pub use model_builder::{Assignment, ModelBuilder, ReforgeModel};
pub use objective::{effective_attack_speed_cap, ObjectiveComposer};
pub use optimizer::{DamageModel, DamageOptimizer, OptimizeOptions, DEFAULT_TIME_LIMIT};
pub use result_formatter::{OptimizationReport, ReforgePlan, StatSummary};
pub use stat_aggregator::{Quantity, StatAggregator, StatVariables};
