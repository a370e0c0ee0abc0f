// Infrastructure: optimizer configuration from the environment

use std::env;

use crate::application::DEFAULT_TIME_LIMIT;
use crate::domain::SolverBackend;

const DEFAULT_GAP_TOLERANCE: f64 = 1e-6;
const DEFAULT_LOG_FILTER: &str = "info";

/// Process-wide optimizer settings
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerConfig {
    /// Wall-clock budget per solve, in seconds
    pub time_limit: f64,
    pub backend: SolverBackend,
    pub gap_tolerance: f64,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            backend: SolverBackend::Auto,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl OptimizerConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REFORGE_TIME_LIMIT` - seconds per solve (default: 4)
    /// - `REFORGE_SOLVER` - `auto`, `microlp` or `highs` (default: auto)
    /// - `REFORGE_GAP_TOLERANCE` - relative optimality gap (default: 1e-6)
    /// - `REFORGE_LOG` - log filter when `RUST_LOG` is unset (default: info)
    ///
    /// Unparseable or out-of-range values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seconds) = read_env::<f64>("REFORGE_TIME_LIMIT") {
            if seconds.is_finite() && seconds >= 0.0 {
                config.time_limit = seconds;
            }
        }
        if let Some(backend) = read_env::<SolverBackend>("REFORGE_SOLVER") {
            config.backend = backend;
        }
        if let Some(gap) = read_env::<f64>("REFORGE_GAP_TOLERANCE") {
            if gap.is_finite() && gap >= 0.0 {
                config.gap_tolerance = gap;
            }
        }
        if let Ok(filter) = env::var("REFORGE_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = OptimizerConfig::default();
        assert_eq!(config.time_limit, 4.0);
        assert_eq!(config.backend, SolverBackend::Auto);
        assert_eq!(config.gap_tolerance, 1e-6);
        assert_eq!(config.log_filter, "info");
    }

    // One test touches the process environment so parallel tests cannot race on it
    #[test]
    fn reads_and_validates_environment() {
        env::set_var("REFORGE_TIME_LIMIT", "2.5");
        env::set_var("REFORGE_SOLVER", "MicroLP");
        env::set_var("REFORGE_GAP_TOLERANCE", "-1");
        let config = OptimizerConfig::from_env();
        assert_eq!(config.time_limit, 2.5);
        assert_eq!(config.backend, SolverBackend::MicroLp);
        assert_eq!(config.gap_tolerance, 1e-6);

        env::set_var("REFORGE_TIME_LIMIT", "soon");
        assert_eq!(OptimizerConfig::from_env().time_limit, 4.0);

        env::remove_var("REFORGE_TIME_LIMIT");
        env::remove_var("REFORGE_SOLVER");
        env::remove_var("REFORGE_GAP_TOLERANCE");
    }
}
