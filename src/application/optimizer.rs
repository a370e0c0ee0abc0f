// Damage optimizer: builds a fresh model per call, solves it and formats
// the result. The catalog is shared read-only between calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    EquipmentClass, InventoryCounts, Model, PlayerProfile, ReforgeCatalog, Solution,
    SolutionStatus, SolverConfig, SolverError, SolverService, VarId,
};

use super::error::{OptimizeError, Result};
use super::model_builder::{Assignment, ModelBuilder};
use super::objective::ObjectiveComposer;
use super::result_formatter::{format_counts, summarize, OptimizationReport};
use super::stat_aggregator::{StatAggregator, StatVariables};

/// Default wall-clock budget of one solve, in seconds
pub const DEFAULT_TIME_LIMIT: f64 = 4.0;

/// Per-call options
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOptions {
    /// Require crit chance of at least 99.5
    pub perfect_crit_chance: bool,
    pub attack_speed_limit: Option<f64>,
    pub only_blacksmith_reforges: bool,
    pub include_dungeon_bonus: bool,
    /// Seconds
    pub time_limit: f64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            perfect_crit_chance: false,
            attack_speed_limit: None,
            only_blacksmith_reforges: false,
            include_dungeon_bonus: false,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl OptimizeOptions {
    pub fn with_perfect_crit_chance(mut self, enabled: bool) -> Self {
        self.perfect_crit_chance = enabled;
        self
    }

    pub fn with_attack_speed_limit(mut self, limit: Option<f64>) -> Self {
        self.attack_speed_limit = limit;
        self
    }

    pub fn with_only_blacksmith_reforges(mut self, enabled: bool) -> Self {
        self.only_blacksmith_reforges = enabled;
        self
    }

    pub fn with_dungeon_bonus(mut self, enabled: bool) -> Self {
        self.include_dungeon_bonus = enabled;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time_limit.is_finite() || self.time_limit < 0.0 {
            return Err(OptimizeError::InvalidOptions(format!(
                "time limit must be a non-negative number of seconds, got {}",
                self.time_limit
            )));
        }
        if let Some(limit) = self.attack_speed_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(OptimizeError::InvalidOptions(format!(
                    "attack speed limit must be positive, got {}",
                    limit
                )));
            }
        }
        Ok(())
    }
}

/// Fully assembled damage model for one call
#[derive(Debug, Clone)]
pub struct DamageModel {
    pub model: Model,
    pub assignments: Vec<Assignment>,
    pub stats: StatVariables,
    pub damage: VarId,
    /// Cap actually enforced on attack speed
    pub attack_speed_cap: Option<f64>,
}

impl DamageModel {
    pub fn report(&self, solution: &Solution, is_optimized: bool) -> OptimizationReport {
        let values = &solution.variable_values;
        OptimizationReport {
            stats: summarize(&self.stats, self.damage, values, is_optimized),
            reforges: format_counts(&self.assignments, values),
        }
    }
}

#[derive(Clone)]
pub struct DamageOptimizer {
    catalog: Arc<ReforgeCatalog>,
    solver: Arc<dyn SolverService>,
    gap_tolerance: Option<f64>,
}

impl DamageOptimizer {
    pub fn new(catalog: Arc<ReforgeCatalog>, solver: Arc<dyn SolverService>) -> Self {
        Self {
            catalog,
            solver,
            gap_tolerance: None,
        }
    }

    pub fn with_gap_tolerance(mut self, tolerance: f64) -> Self {
        self.gap_tolerance = Some(tolerance);
        self
    }

    pub fn catalog(&self) -> &ReforgeCatalog {
        &self.catalog
    }

    /// Assemble the model without solving it
    pub fn build(&self, profile: &dyn PlayerProfile, options: &OptimizeOptions) -> Result<DamageModel> {
        options.validate()?;

        let weapon = profile
            .weapon()
            .ok_or_else(|| OptimizeError::InvalidProfile("profile has no weapon".to_string()))?;
        if !weapon.class.is_weapon() {
            return Err(OptimizeError::InvalidProfile(format!(
                "held item {} is a {}, not a weapon",
                weapon.internal_name, weapon.class
            )));
        }
        let inventory = InventoryCounts::from_profile(profile)
            .ok_or_else(|| OptimizeError::InvalidProfile("profile has no weapon".to_string()))?;

        for class in inventory.classes() {
            if class != EquipmentClass::Talisman && profile.slot_scaling(class).is_none() {
                return Err(OptimizeError::InvalidProfile(format!(
                    "no stat scaling reported for the {} slot",
                    class
                )));
            }
        }

        let view = self
            .catalog
            .restricted_for(&weapon.internal_name, options.only_blacksmith_reforges);

        let mut reforge_model = ModelBuilder::new(&inventory, &view).build("damage");
        let stats = StatAggregator::new(profile, &view, options.include_dungeon_bonus)
            .define(&mut reforge_model)?;

        let composer =
            ObjectiveComposer::new(options.perfect_crit_chance, options.attack_speed_limit);
        let damage = composer.compose(&mut reforge_model.model, &stats);

        let config = SolverConfig {
            time_limit: Some(options.time_limit),
            gap_tolerance: self.gap_tolerance,
            ..SolverConfig::default()
        };
        let model = reforge_model.model.with_config(config);

        debug!(
            weapon = %weapon.internal_name,
            assignments = reforge_model.assignments.len(),
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "built damage model"
        );

        Ok(DamageModel {
            model,
            assignments: reforge_model.assignments,
            stats,
            damage,
            attack_speed_cap: composer.attack_speed_cap(),
        })
    }

    /// Build, solve and format; blocks for up to the configured time limit
    pub fn optimize(
        &self,
        profile: &dyn PlayerProfile,
        options: &OptimizeOptions,
    ) -> Result<OptimizationReport> {
        let damage_model = self.build(profile, options)?;
        let solution = self.solver.solve(&damage_model.model)?;

        match solution.status {
            SolutionStatus::Optimal if solution.has_values() => {
                info!(
                    objective = solution.optimal_value.unwrap_or_default(),
                    solve_ms = solution.statistics.solve_time_ms,
                    "optimal reforge plan found"
                );
                Ok(damage_model.report(&solution, true))
            }
            SolutionStatus::Feasible | SolutionStatus::TimeLimit | SolutionStatus::IterationLimit
                if solution.has_values() =>
            {
                warn!(
                    status = %solution.status,
                    gap = solution.gap.unwrap_or(f64::NAN),
                    "returning best plan found before the solver stopped"
                );
                Ok(damage_model.report(&solution, false))
            }
            SolutionStatus::Infeasible => Err(OptimizeError::InfeasibleModel(solution.message)),
            SolutionStatus::TimeLimit | SolutionStatus::IterationLimit => {
                Err(OptimizeError::NoSolutionWithinBudget {
                    seconds: options.time_limit,
                })
            }
            status => Err(OptimizeError::Solver(SolverError::ExecutionFailed(format!(
                "solver finished with status {}: {}",
                status, solution.message
            )))),
        }
    }

    /// Run [`optimize`](Self::optimize) on the blocking thread pool
    pub async fn optimize_in_background(
        &self,
        profile: Arc<dyn PlayerProfile>,
        options: OptimizeOptions,
    ) -> Result<OptimizationReport> {
        let optimizer = self.clone();
        tokio::task::spawn_blocking(move || optimizer.optimize(profile.as_ref(), &options))
            .await
            .map_err(|e| OptimizeError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProfileSnapshot, Rarity, Weapon};

    struct Unavailable;

    impl SolverService for Unavailable {
        fn solve(&self, _model: &Model) -> crate::domain::solver_service::Result<Solution> {
            Err(SolverError::SolverNotAvailable("no backend".into()))
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    fn optimizer() -> DamageOptimizer {
        DamageOptimizer::new(Arc::new(ReforgeCatalog::new()), Arc::new(Unavailable))
    }

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot::new(Weapon {
            internal_name: "HYPERION".into(),
            class: EquipmentClass::Sword,
            rarity: Rarity::Legendary,
        })
    }

    #[test]
    fn options_reject_non_positive_speed_limit() {
        let options = OptimizeOptions::default().with_attack_speed_limit(Some(0.0));
        assert!(matches!(
            options.validate(),
            Err(OptimizeError::InvalidOptions(_))
        ));
        let options = OptimizeOptions::default().with_time_limit(-1.0);
        assert!(options.validate().is_err());
        assert!(OptimizeOptions::default().validate().is_ok());
    }

    #[test]
    fn profile_without_weapon_fails_before_building() {
        let mut profile = profile();
        profile.weapon = None;
        let err = optimizer()
            .build(&profile, &OptimizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidProfile(_)));
    }

    #[test]
    fn held_armor_piece_is_not_a_weapon() {
        let mut profile = profile().with_slot(crate::domain::SlotScaling::new(EquipmentClass::Helmet, 1.0));
        profile.weapon = Some(Weapon {
            internal_name: "SUPERIOR_DRAGON_HELMET".into(),
            class: EquipmentClass::Helmet,
            rarity: Rarity::Legendary,
        });
        let err = optimizer()
            .build(&profile, &OptimizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidProfile(_)));
        assert!(err.to_string().contains("not a weapon"));
    }

    #[test]
    fn owned_slot_without_scaling_is_rejected() {
        let err = optimizer()
            .build(&profile(), &OptimizeOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("sword slot"));
    }

    #[test]
    fn unavailable_solver_is_reported() {
        let profile = profile().with_slot(crate::domain::SlotScaling::new(EquipmentClass::Sword, 1.0));
        let err = optimizer()
            .optimize(&profile, &OptimizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, OptimizeError::SolverUnavailable(_)));
    }

    #[test]
    fn build_carries_time_limit_and_cap() {
        let profile = profile().with_slot(crate::domain::SlotScaling::new(EquipmentClass::Sword, 1.0));
        let options = OptimizeOptions::default()
            .with_time_limit(1.5)
            .with_attack_speed_limit(Some(100.0));
        let built = optimizer().build(&profile, &options).unwrap();
        assert_eq!(built.model.solver_config.time_limit, Some(1.5));
        assert_eq!(built.attack_speed_cap, Some(100.5));
        assert!(built.assignments.is_empty());
    }
}
