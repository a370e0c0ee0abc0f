// Result Formatter: solver values to a reforge plan and a stat summary

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::{EquipmentClass, Rarity, VarId};

use super::model_builder::Assignment;
use super::objective::FIXED_ATTACK_SPEED;
use super::stat_aggregator::StatVariables;

/// `class → rarity → reforge → count`
pub type ReforgePlan = BTreeMap<EquipmentClass, BTreeMap<Rarity, BTreeMap<String, u32>>>;

/// Resolved stats of the chosen plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSummary {
    pub strength: f64,
    pub crit_damage: f64,
    pub crit_chance: f64,
    pub attack_speed: f64,
    pub weapon_damage: f64,
    /// Value of the damage formula
    pub damage: f64,
    /// False when the solver stopped before proving optimality
    pub is_optimized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub stats: StatSummary,
    pub reforges: ReforgePlan,
}

impl OptimizationReport {
    /// Items of one (class, rarity) bucket covered by the plan
    pub fn total_for(&self, class: EquipmentClass, rarity: Rarity) -> u32 {
        self.reforges
            .get(&class)
            .and_then(|rarities| rarities.get(&rarity))
            .map(|reforges| reforges.values().sum())
            .unwrap_or(0)
    }

    pub fn count(&self, class: EquipmentClass, rarity: Rarity, reforge: &str) -> u32 {
        self.reforges
            .get(&class)
            .and_then(|rarities| rarities.get(&rarity))
            .and_then(|reforges| reforges.get(reforge))
            .copied()
            .unwrap_or(0)
    }
}

/// Round each decision value and keep the positive counts
pub fn format_counts(assignments: &[Assignment], values: &[f64]) -> ReforgePlan {
    let mut plan = ReforgePlan::new();
    for assignment in assignments {
        let count = values
            .get(assignment.variable.index())
            .copied()
            .unwrap_or(0.0)
            .round();
        if count > 0.0 {
            plan.entry(assignment.class)
                .or_default()
                .entry(assignment.rarity)
                .or_default()
                .insert(assignment.reforge.clone(), count as u32);
        }
    }
    plan
}

pub fn summarize(
    stats: &StatVariables,
    damage: VarId,
    values: &[f64],
    is_optimized: bool,
) -> StatSummary {
    let value = |id: VarId| values.get(id.index()).copied().unwrap_or(f64::NAN);

    StatSummary {
        strength: value(stats.strength),
        crit_damage: value(stats.crit_damage),
        crit_chance: value(stats.crit_chance),
        attack_speed: stats.attack_speed.map_or(FIXED_ATTACK_SPEED, value),
        weapon_damage: stats.weapon_damage.resolve(values),
        damage: value(damage),
        is_optimized,
    }
}

impl fmt::Display for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;
        writeln!(f, "strength: {:.1}", stats.strength)?;
        writeln!(f, "crit damage: {:.1}", stats.crit_damage)?;
        writeln!(f, "crit chance: {:.1}", stats.crit_chance)?;
        writeln!(f, "attack speed: {:.1}", stats.attack_speed)?;
        writeln!(f, "weapon damage: {:.1}", stats.weapon_damage)?;
        writeln!(f, "damage: {:.1}", stats.damage)?;
        if !stats.is_optimized {
            writeln!(f, "(best plan found within the time limit, not proven optimal)")?;
        }

        for (class, rarities) in &self.reforges {
            for (rarity, reforges) in rarities {
                for (reforge, count) in reforges {
                    writeln!(f, "{} × {} {} → {}", count, rarity, class, reforge)?;
                }
            }
        }
        Ok(())
    }
}
