// Model Builder: one integer decision variable per valid
// (equipment class, rarity, reforge) triple, plus the inventory equalities

use tracing::debug;

use crate::domain::{
    Constraint, EquipmentClass, Expr, InventoryCounts, Model, Rarity, ReforgeView, VarId,
    Variable,
};

/// How many items of one (class, rarity) bucket get one reforge
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub class: EquipmentClass,
    pub rarity: Rarity,
    pub reforge: String,
    pub variable: VarId,
}

/// Model holding the decision variables and inventory constraints
#[derive(Debug, Clone)]
pub struct ReforgeModel {
    pub model: Model,
    pub assignments: Vec<Assignment>,
}

impl ReforgeModel {
    pub fn assignments_for(&self, class: EquipmentClass) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(move |a| a.class == class)
    }

    pub fn find(&self, class: EquipmentClass, rarity: Rarity, reforge: &str) -> Option<VarId> {
        self.assignments
            .iter()
            .find(|a| a.class == class && a.rarity == rarity && a.reforge == reforge)
            .map(|a| a.variable)
    }
}

pub struct ModelBuilder<'a> {
    inventory: &'a InventoryCounts,
    catalog: &'a ReforgeView<'a>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(inventory: &'a InventoryCounts, catalog: &'a ReforgeView<'a>) -> Self {
        Self { inventory, catalog }
    }

    pub fn build(&self, name: impl Into<String>) -> ReforgeModel {
        let mut model = Model::new(name);
        let mut assignments = Vec::new();

        // Zero-count buckets never reach this loop
        for (class, rarity, count) in self.inventory.non_empty() {
            let mut bucket = Vec::new();

            for reforge in self.catalog.reforges(class.catalog_key()) {
                if !reforge.supports(rarity) {
                    continue;
                }
                let variable = model.add_variable(
                    Variable::integer(format!("{}/{}/{}", class, rarity, reforge.name))
                        .with_bounds(0.0, Some(f64::from(count))),
                );
                bucket.push(variable);
                assignments.push(Assignment {
                    class,
                    rarity,
                    reforge: reforge.name.clone(),
                    variable,
                });
            }

            // Items without any applicable reforge simply stay unreforged
            if bucket.is_empty() {
                debug!(%class, %rarity, count, "no reforge applies to bucket");
                continue;
            }

            let total: Expr = bucket.into_iter().map(Expr::var).sum();
            model.add_constraint(
                Constraint::eq(total, f64::from(count))
                    .with_name(format!("count[{}/{}]", class, rarity)),
            );
        }

        ReforgeModel { model, assignments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogKey, ReforgeCatalog, ReforgeDefinition, Stat};

    fn catalog() -> ReforgeCatalog {
        ReforgeCatalog::new()
            .with_reforge(
                CatalogKey::Talisman,
                ReforgeDefinition::new("hurtful", true)
                    .with_bonus(Rarity::Common, Stat::CritDamage, 4.0)
                    .with_bonus(Rarity::Epic, Stat::CritDamage, 9.0),
            )
            .with_reforge(
                CatalogKey::Talisman,
                ReforgeDefinition::new("itchy", false)
                    .with_bonus(Rarity::Epic, Stat::Strength, 4.0),
            )
            .with_reforge(
                CatalogKey::Armor,
                ReforgeDefinition::new("fierce", true)
                    .with_bonus(Rarity::Legendary, Stat::Strength, 8.0),
            )
    }

    #[test]
    fn creates_variables_only_for_owned_supported_buckets() {
        let catalog = catalog();
        let view = catalog.restricted_for("HYPERION", false);
        let inventory = InventoryCounts::new()
            .with(EquipmentClass::Talisman, Rarity::Common, 3)
            .with(EquipmentClass::Talisman, Rarity::Epic, 2)
            .with(EquipmentClass::Talisman, Rarity::Rare, 0)
            .with(EquipmentClass::Helmet, Rarity::Legendary, 1)
            .with(EquipmentClass::Boots, Rarity::Legendary, 1);

        let built = ModelBuilder::new(&inventory, &view).build("test");

        // common: hurtful; epic: hurtful, itchy; helmet and boots: fierce
        assert_eq!(built.assignments.len(), 5);
        assert!(built
            .find(EquipmentClass::Talisman, Rarity::Common, "itchy")
            .is_none());
        assert!(built
            .assignments
            .iter()
            .all(|a| a.rarity != Rarity::Rare));
        assert_eq!(built.model.constraints().len(), 4);
        assert_eq!(built.assignments_for(EquipmentClass::Boots).count(), 1);

        let var = built
            .find(EquipmentClass::Talisman, Rarity::Common, "hurtful")
            .unwrap();
        assert_eq!(built.model.variable(var).unwrap().upper_bound, Some(3.0));
    }

    #[test]
    fn count_constraints_match_inventory() {
        let catalog = catalog();
        let view = catalog.restricted_for("HYPERION", false);
        let inventory = InventoryCounts::new().with(EquipmentClass::Talisman, Rarity::Epic, 2);
        let built = ModelBuilder::new(&inventory, &view).build("test");

        let constraint = &built.model.constraints()[0];
        assert_eq!(constraint.name, "count[talisman/epic]");
        assert_eq!(constraint.bound, 2.0);
        assert_eq!(constraint.violation(&[1.0, 1.0]), 0.0);
        assert_eq!(constraint.violation(&[2.0, 1.0]), 1.0);
    }

    #[test]
    fn blacksmith_mode_drops_other_reforges() {
        let catalog = catalog();
        let view = catalog.restricted_for("HYPERION", true);
        let inventory = InventoryCounts::new().with(EquipmentClass::Talisman, Rarity::Epic, 2);
        let built = ModelBuilder::new(&inventory, &view).build("test");

        assert_eq!(built.assignments.len(), 1);
        assert_eq!(built.assignments[0].reforge, "hurtful");
    }

    #[test]
    fn buckets_without_reforges_emit_no_constraint() {
        let catalog = catalog();
        let view = catalog.restricted_for("HYPERION", false);
        let inventory = InventoryCounts::new().with(EquipmentClass::Talisman, Rarity::Mythic, 4);
        let built = ModelBuilder::new(&inventory, &view).build("test");

        assert!(built.assignments.is_empty());
        assert!(built.model.constraints().is_empty());
    }
}
