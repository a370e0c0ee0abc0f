#![allow(dead_code)]

use std::sync::Arc;

use reforge_optimizer::domain::{
    unique_items, ArmorPiece, CatalogKey, SlotScaling, StatReadings, Weapon,
};
use reforge_optimizer::{
    DamageOptimizer, EquipmentClass, OptimizeOptions, ProfileSnapshot, Rarity, ReforgeCatalog,
    ReforgeDefinition, SolverBackend, SolverFactory, Stat,
};

/// Generous budget so debug builds still prove optimality
pub const TEST_TIME_LIMIT: f64 = 60.0;

fn talisman_reforges() -> Vec<ReforgeDefinition> {
    vec![
        ReforgeDefinition::new("hurtful", true)
            .with_bonus(Rarity::Common, Stat::CritDamage, 4.0)
            .with_bonus(Rarity::Epic, Stat::CritDamage, 9.0)
            .with_bonus(Rarity::Legendary, Stat::CritDamage, 14.0),
        ReforgeDefinition::new("strong", true)
            .with_bonus(Rarity::Common, Stat::Strength, 1.0)
            .with_bonus(Rarity::Common, Stat::CritDamage, 1.0)
            .with_bonus(Rarity::Epic, Stat::Strength, 5.0)
            .with_bonus(Rarity::Epic, Stat::CritDamage, 5.0)
            .with_bonus(Rarity::Legendary, Stat::Strength, 8.0)
            .with_bonus(Rarity::Legendary, Stat::CritDamage, 8.0),
        ReforgeDefinition::new("forceful", true)
            .with_bonus(Rarity::Common, Stat::Strength, 4.0)
            .with_bonus(Rarity::Epic, Stat::Strength, 10.0)
            .with_bonus(Rarity::Legendary, Stat::Strength, 15.0),
        ReforgeDefinition::new("itchy", false)
            .with_bonus(Rarity::Common, Stat::Strength, 1.0)
            .with_bonus(Rarity::Common, Stat::CritDamage, 3.0)
            .with_bonus(Rarity::Epic, Stat::Strength, 4.0)
            .with_bonus(Rarity::Epic, Stat::CritDamage, 8.0)
            .with_bonus(Rarity::Epic, Stat::AttackSpeed, 2.0),
    ]
}

fn weapon_and_armor() -> Vec<(CatalogKey, ReforgeDefinition)> {
    vec![
        (
            CatalogKey::Sword,
            ReforgeDefinition::new("spicy", true)
                .with_bonus(Rarity::Legendary, Stat::Strength, 10.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 80.0)
                .with_bonus(Rarity::Legendary, Stat::CritChance, 1.0)
                .with_bonus(Rarity::Legendary, Stat::AttackSpeed, 10.0),
        ),
        (
            CatalogKey::Sword,
            ReforgeDefinition::new("sharp", true)
                .with_bonus(Rarity::Legendary, Stat::CritChance, 20.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 75.0),
        ),
        (
            CatalogKey::Sword,
            ReforgeDefinition::new("fabled", false)
                .with_bonus(Rarity::Legendary, Stat::Strength, 75.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 35.0),
        ),
        (
            CatalogKey::Sword,
            ReforgeDefinition::new("gilded", false)
                .requiring_weapon(unique_items::MIDAS_SWORD)
                .with_bonus(Rarity::Legendary, Stat::Strength, 30.0)
                .with_bonus(Rarity::Legendary, Stat::Damage, 75.0),
        ),
        (
            CatalogKey::Sword,
            ReforgeDefinition::new("warped", false)
                .requiring_weapon(unique_items::ASPECT_OF_THE_END)
                .with_bonus(Rarity::Legendary, Stat::Strength, 165.0),
        ),
        (
            CatalogKey::Dagger,
            ReforgeDefinition::new("fair", true)
                .with_bonus(Rarity::Legendary, Stat::Strength, 10.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 10.0)
                .with_bonus(Rarity::Legendary, Stat::AttackSpeed, 10.0),
        ),
        (
            CatalogKey::Armor,
            ReforgeDefinition::new("fierce", true)
                .with_bonus(Rarity::Legendary, Stat::Strength, 8.0)
                .with_bonus(Rarity::Legendary, Stat::CritChance, 5.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 18.0),
        ),
        (
            CatalogKey::Armor,
            ReforgeDefinition::new("renowned", false)
                .with_bonus(Rarity::Legendary, Stat::Strength, 8.0)
                .with_bonus(Rarity::Legendary, Stat::CritChance, 8.0)
                .with_bonus(Rarity::Legendary, Stat::CritDamage, 8.0)
                .with_bonus(Rarity::Legendary, Stat::AttackSpeed, 1.0),
        ),
    ]
}

/// Fixture catalog plus a dozen extra talisman reforges for every rarity
pub fn large_catalog() -> ReforgeCatalog {
    let mut catalog = catalog();
    for i in 0..12u32 {
        let step = f64::from(i);
        let reforge = Rarity::ALL.iter().zip(1u32..).fold(
            ReforgeDefinition::new(format!("extra{}", i), i % 3 == 0),
            |reforge, (&rarity, tier)| {
                let tier = f64::from(tier);
                reforge
                    .with_bonus(rarity, Stat::Strength, tier * (1.0 + step % 4.0))
                    .with_bonus(rarity, Stat::CritDamage, tier * (1.0 + (11.0 - step) % 5.0))
                    .with_bonus(rarity, Stat::CritChance, tier * (step % 2.0))
                    .with_bonus(rarity, Stat::AttackSpeed, tier * (step % 3.0) / 2.0)
            },
        );
        catalog.insert(CatalogKey::Talisman, reforge);
    }
    catalog
}

pub fn catalog() -> ReforgeCatalog {
    let mut catalog = ReforgeCatalog::new();
    for reforge in talisman_reforges() {
        catalog.insert(CatalogKey::Talisman, reforge);
    }
    for (key, reforge) in weapon_and_armor() {
        catalog.insert(key, reforge);
    }
    catalog
}

/// Same catalog without any talisman reforge
pub fn catalog_without_talismans() -> ReforgeCatalog {
    let mut catalog = ReforgeCatalog::new();
    for (key, reforge) in weapon_and_armor() {
        catalog.insert(key, reforge);
    }
    catalog
}

pub fn sword_profile(internal_name: &str) -> ProfileSnapshot {
    ProfileSnapshot::new(Weapon {
        internal_name: internal_name.into(),
        class: EquipmentClass::Sword,
        rarity: Rarity::Legendary,
    })
    .with_talismans(Rarity::Epic, 1)
    .with_stat(Stat::Strength, StatReadings::uniform(143.0))
    .with_stat(Stat::CritDamage, StatReadings::uniform(87.0))
    .with_stat(Stat::CritChance, StatReadings::uniform(31.0))
    .with_stat(Stat::AttackSpeed, StatReadings::uniform(12.0))
    .with_weapon_damage(StatReadings::uniform(200.0))
    .with_slot(SlotScaling::new(EquipmentClass::Sword, 1.0))
}

pub fn midas_profile() -> ProfileSnapshot {
    sword_profile(unique_items::MIDAS_SWORD).with_weapon_damage(StatReadings {
        total: 300.0,
        base: 250.0,
        raw: 300.0,
        base_raw: 250.0,
    })
}

pub fn livid_profile() -> ProfileSnapshot {
    ProfileSnapshot::new(Weapon {
        internal_name: unique_items::LIVID_DAGGER.into(),
        class: EquipmentClass::Dagger,
        rarity: Rarity::Legendary,
    })
    .with_talismans(Rarity::Common, 2)
    .with_stat(Stat::Strength, StatReadings::uniform(121.0))
    .with_stat(Stat::CritDamage, StatReadings::uniform(64.0))
    .with_weapon_damage(StatReadings::uniform(210.0))
    .with_slot(SlotScaling::new(EquipmentClass::Dagger, 1.0))
}

pub fn with_legendary_armor(profile: ProfileSnapshot, slots: &[EquipmentClass]) -> ProfileSnapshot {
    slots.iter().fold(profile, |profile, &slot| {
        profile
            .with_armor(
                slot,
                ArmorPiece {
                    internal_name: format!("SUPERIOR_DRAGON_{}", slot.as_str().to_uppercase()),
                    rarity: Rarity::Legendary,
                },
            )
            .with_slot(SlotScaling::new(slot, 1.0))
    })
}

/// Fifteen talismans per rarity, a full armor set with a Tarantula helmet
pub fn crowded_profile() -> ProfileSnapshot {
    let profile = Rarity::ALL
        .iter()
        .fold(sword_profile("HYPERION"), |profile, &rarity| {
            profile.with_talismans(rarity, 15)
        });
    with_legendary_armor(
        profile,
        &[
            EquipmentClass::Chestplate,
            EquipmentClass::Leggings,
            EquipmentClass::Boots,
        ],
    )
    .with_armor(
        EquipmentClass::Helmet,
        ArmorPiece {
            internal_name: unique_items::TARANTULA_HELMET.into(),
            rarity: Rarity::Legendary,
        },
    )
    .with_slot(SlotScaling::new(EquipmentClass::Helmet, 1.0))
}

pub fn optimizer_with(catalog: ReforgeCatalog) -> DamageOptimizer {
    let solver = SolverFactory::create_from_backend(SolverBackend::MicroLp)
        .expect("microlp backend is always compiled in");
    DamageOptimizer::new(Arc::new(catalog), solver)
}

pub fn optimizer() -> DamageOptimizer {
    optimizer_with(catalog())
}

pub fn options() -> OptimizeOptions {
    OptimizeOptions::default().with_time_limit(TEST_TIME_LIMIT)
}
