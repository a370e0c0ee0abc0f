// Objective Composer: damage formula, speed-adjusted objective and the
// crit chance / attack speed bounds

use crate::domain::{Constraint, Expr, Model, ObjectiveFunction, VarId, Variable};

use super::stat_aggregator::StatVariables;

pub const CRIT_CHANCE_FLOOR: f64 = 99.5;
/// Attack speed assumed in the speed factor for weapons without one
pub const FIXED_ATTACK_SPEED: f64 = 100.0;
const BASE_DAMAGE: f64 = 5.0;
const ROUNDING_ALLOWANCE: f64 = 0.5;

/// Cap enforced for a requested attack speed limit
///
/// A literal limit of 100 gets a 0.5 allowance for display rounding.
pub fn effective_attack_speed_cap(limit: f64) -> f64 {
    if limit == 100.0 {
        limit + ROUNDING_ALLOWANCE
    } else {
        limit
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveComposer {
    perfect_crit_chance: bool,
    attack_speed_limit: Option<f64>,
}

impl ObjectiveComposer {
    pub fn new(perfect_crit_chance: bool, attack_speed_limit: Option<f64>) -> Self {
        Self {
            perfect_crit_chance,
            attack_speed_limit,
        }
    }

    pub fn attack_speed_cap(&self) -> Option<f64> {
        self.attack_speed_limit.map(effective_attack_speed_cap)
    }

    /// Add the damage definition, bounds and objective; returns `dmg`
    pub fn compose(&self, model: &mut Model, stats: &StatVariables) -> VarId {
        if self.perfect_crit_chance {
            model.add_constraint(
                Constraint::geq(Expr::var(stats.crit_chance), CRIT_CHANCE_FLOOR)
                    .with_name("crit_chance_floor"),
            );
        }

        if let (Some(cap), Some(a)) = (self.attack_speed_cap(), stats.attack_speed) {
            model.add_constraint(Constraint::leq(Expr::var(a), cap).with_name("attack_speed_cap"));
        }

        let dmg = model.add_variable(Variable::free("dmg"));
        let damage = (BASE_DAMAGE + stats.weapon_damage.expr() + Expr::var(stats.floored_strength))
            * (1.0 + Expr::var(stats.strength) / 100.0)
            * (1.0 + Expr::var(stats.crit_damage) / 100.0);
        model.define("damage", dmg, damage);

        let objective = if self.attack_speed_limit.is_some() {
            let speed = match stats.attack_speed {
                Some(a) => Expr::var(a),
                None => Expr::constant(FIXED_ATTACK_SPEED),
            };
            Expr::var(dmg) * ((speed + 100.0) / 100.0 / 0.5)
        } else {
            Expr::var(dmg)
        };
        model.set_objective(ObjectiveFunction::maximize(objective));

        dmg
    }
}
