// Infrastructure layer: environment configuration and logging

pub mod config;
pub mod logging;

pub use config::OptimizerConfig;
pub use logging::init_tracing;
