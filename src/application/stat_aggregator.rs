// Stat Aggregator: derived stats as expressions over decision variables
//
// Every stat is `m * (Σ class factor * Σ bonus * count + base raw stat)`,
// where talismans have factor 1 and armor/weapon slots use the multiplier
// (and optionally the dungeon bonus) reported by the profile.

use crate::domain::{
    unique_items, Constraint, EquipmentClass, Expr, Model, PlayerProfile, ReforgeView, Stat,
    StatQuery, VarId, Variable,
};

use super::error::{OptimizeError, Result};
use super::model_builder::{Assignment, ReforgeModel};

/// Armor reforge raising the global multiplier
pub const RENOWNED: &str = "renowned";
const RENOWNED_STEP: f64 = 0.01;

/// Slack of the floor linearization: `fs >= x - 0.9999`
pub const FLOOR_SLACK: f64 = 0.9999;
const STRENGTH_PER_FLOORED_POINT: f64 = 5.0;

/// A quantity that is either modeled or fixed by the profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Free(VarId),
    Fixed(f64),
}

impl Quantity {
    pub fn expr(&self) -> Expr {
        match self {
            Quantity::Free(id) => Expr::var(*id),
            Quantity::Fixed(value) => Expr::constant(*value),
        }
    }

    pub fn resolve(&self, values: &[f64]) -> f64 {
        match self {
            Quantity::Free(id) => values.get(id.index()).copied().unwrap_or(f64::NAN),
            Quantity::Fixed(value) => *value,
        }
    }

    pub fn variable(&self) -> Option<VarId> {
        match self {
            Quantity::Free(id) => Some(*id),
            Quantity::Fixed(_) => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Quantity::Free(_))
    }
}

/// Handles on the derived quantities of a damage model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatVariables {
    pub strength: VarId,
    pub crit_damage: VarId,
    pub crit_chance: VarId,
    /// `None` for weapons without an attack speed stat
    pub attack_speed: Option<VarId>,
    pub multiplier: Quantity,
    pub weapon_damage: Quantity,
    pub floored_strength: VarId,
}

/// Add an integer `q` with `x / divisor - 0.9999 <= q <= x / divisor`
pub fn floor_division(model: &mut Model, name: &str, numerator: Expr, divisor: f64) -> VarId {
    let floored =
        model.add_variable(Variable::integer(name).with_bounds(f64::NEG_INFINITY, None));
    let quotient = numerator / divisor;

    model.add_constraint(
        Constraint::geq(Expr::var(floored) - quotient.clone(), -FLOOR_SLACK)
            .with_name(format!("{}_lower", name)),
    );
    model.add_constraint(
        Constraint::leq(Expr::var(floored) - quotient, 0.0).with_name(format!("{}_upper", name)),
    );

    floored
}

pub struct StatAggregator<'a> {
    profile: &'a dyn PlayerProfile,
    catalog: &'a ReforgeView<'a>,
    include_dungeon: bool,
}

impl<'a> StatAggregator<'a> {
    pub fn new(
        profile: &'a dyn PlayerProfile,
        catalog: &'a ReforgeView<'a>,
        include_dungeon: bool,
    ) -> Self {
        Self {
            profile,
            catalog,
            include_dungeon,
        }
    }

    /// Reforge contribution to `stat`, without profile base values
    pub fn aggregate(&self, assignments: &[Assignment], stat: Stat) -> Result<Expr> {
        let mut classes: Vec<EquipmentClass> = assignments.iter().map(|a| a.class).collect();
        classes.sort();
        classes.dedup();

        let mut total = Expr::zero();
        for class in classes {
            let factor = self.class_factor(class, stat)?;
            let sum: Expr = assignments
                .iter()
                .filter(|a| a.class == class)
                .filter_map(|a| {
                    let bonus = self.bonus(a, stat);
                    (bonus != 0.0).then(|| bonus * a.variable)
                })
                .sum();
            total += sum.scale(factor);
        }

        Ok(total)
    }

    fn class_factor(&self, class: EquipmentClass, stat: Stat) -> Result<f64> {
        if class == EquipmentClass::Talisman {
            return Ok(1.0);
        }
        let slot = self.profile.slot_scaling(class).ok_or_else(|| {
            OptimizeError::InvalidProfile(format!("no stat scaling reported for the {} slot", class))
        })?;
        let dungeon = if self.include_dungeon {
            slot.dungeon_bonus(stat)
        } else {
            1.0
        };
        Ok(slot.multiplier * dungeon)
    }

    fn bonus(&self, assignment: &Assignment, stat: Stat) -> f64 {
        self.catalog
            .get(assignment.class.catalog_key(), &assignment.reforge)
            .map(|reforge| reforge.bonus(assignment.rarity, stat))
            .unwrap_or(0.0)
    }

    fn base_raw(&self, stat: Stat) -> f64 {
        self.profile
            .stat(stat, StatQuery::base_raw(self.include_dungeon))
    }

    /// Define m, wd, cc, a, s, cd and fs on the model
    pub fn define(&self, reforge_model: &mut ReforgeModel) -> Result<StatVariables> {
        let weapon = self
            .profile
            .weapon()
            .ok_or_else(|| OptimizeError::InvalidProfile("profile has no weapon".to_string()))?;
        let only_blacksmith = self.catalog.only_blacksmith();
        let ReforgeModel { model, assignments } = reforge_model;
        let assignments: &[Assignment] = assignments;

        let multiplier = if only_blacksmith {
            Quantity::Fixed(self.profile.stat_multiplier())
        } else {
            let m = model.add_variable(Variable::free("m"));
            let renowned: Expr = assignments
                .iter()
                .filter(|a| a.class.is_armor() && a.reforge == RENOWNED)
                .map(|a| RENOWNED_STEP * a.variable)
                .sum();
            model.define("multiplier", m, self.profile.stat_multiplier() + renowned);
            Quantity::Free(m)
        };

        let weapon_damage = if weapon.is(unique_items::MIDAS_SWORD) && !only_blacksmith {
            let wd = model.add_variable(Variable::free("wd"));
            let base = self.profile.weapon_damage(StatQuery {
                base: true,
                raw: false,
                dungeon: self.include_dungeon,
            });
            let bonus: Expr = assignments
                .iter()
                .filter(|a| a.class == weapon.class)
                .map(|a| self.bonus(a, Stat::Damage) * a.variable)
                .sum();
            model.define("weapon_damage", wd, base + bonus);
            Quantity::Free(wd)
        } else {
            Quantity::Fixed(self.profile.weapon_damage(StatQuery {
                base: false,
                raw: false,
                dungeon: self.include_dungeon,
            }))
        };

        let m = multiplier.expr();

        let cc = model.add_variable(Variable::free("cc"));
        let value = self.aggregate(assignments, Stat::CritChance)? + self.base_raw(Stat::CritChance);
        model.define("crit_chance", cc, m.clone() * value);

        let attack_speed = if weapon.is(unique_items::LIVID_DAGGER) {
            None
        } else {
            let a = model.add_variable(Variable::free("a"));
            let value =
                self.aggregate(assignments, Stat::AttackSpeed)? + self.base_raw(Stat::AttackSpeed);
            model.define("attack_speed", a, m.clone() * value);
            Some(a)
        };

        let s = model.add_variable(Variable::free("s"));
        let value = self.aggregate(assignments, Stat::Strength)? + self.base_raw(Stat::Strength);
        model.define("strength", s, m.clone() * value);

        let tarantula = self
            .profile
            .armor(EquipmentClass::Helmet)
            .is_some_and(|helmet| helmet.internal_name == unique_items::TARANTULA_HELMET);
        let cd = model.add_variable(Variable::free("cd"));
        let mut value =
            self.aggregate(assignments, Stat::CritDamage)? + self.base_raw(Stat::CritDamage);
        if tarantula {
            value += Expr::var(s) / 10.0;
        }
        model.define("crit_damage", cd, m * value);

        let fs = floor_division(model, "fs", Expr::var(s), STRENGTH_PER_FLOORED_POINT);

        Ok(StatVariables {
            strength: s,
            crit_damage: cd,
            crit_chance: cc,
            attack_speed,
            multiplier,
            weapon_damage,
            floored_strength: fs,
        })
    }
}
