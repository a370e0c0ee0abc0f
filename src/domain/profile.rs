// Read-only view of a player's profile, as consumed by the optimizer

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::CatalogError;
use super::value_objects::{EquipmentClass, Rarity, Stat};

/// Internal names of items the damage model treats specially
pub mod unique_items {
    /// Weapon whose damage scales with the "gilded" reforge
    pub const MIDAS_SWORD: &str = "MIDAS_SWORD";
    /// Dagger without an attack speed stat
    pub const LIVID_DAGGER: &str = "LIVID_DAGGER";
    /// Helmet that turns strength into crit damage
    pub const TARANTULA_HELMET: &str = "TARANTULA_HELMET";
    /// Sword enabling the "warped" reforge
    pub const ASPECT_OF_THE_END: &str = "ASPECT_OF_THE_END";
}

/// Equipped weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub internal_name: String,
    pub class: EquipmentClass,
    pub rarity: Rarity,
}

impl Weapon {
    pub fn is(&self, internal_name: &str) -> bool {
        self.internal_name == internal_name
    }
}

/// Equipped armor piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorPiece {
    pub internal_name: String,
    pub rarity: Rarity,
}

/// Per-slot stat scaling reported by the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotScaling {
    pub class: EquipmentClass,
    pub multiplier: f64,
    /// Per-stat factor applied in dungeon calculations, 1 when absent
    #[serde(default)]
    pub dungeon_bonus: BTreeMap<String, f64>,
}

impl SlotScaling {
    pub fn new(class: EquipmentClass, multiplier: f64) -> Self {
        Self {
            class,
            multiplier,
            dungeon_bonus: BTreeMap::new(),
        }
    }

    pub fn with_dungeon_bonus(mut self, stat: Stat, factor: f64) -> Self {
        self.dungeon_bonus.insert(stat.key().to_string(), factor);
        self
    }

    pub fn dungeon_bonus(&self, stat: Stat) -> f64 {
        self.dungeon_bonus.get(stat.key()).copied().unwrap_or(1.0)
    }
}

/// Which reading of a stat to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatQuery {
    /// Exclude item and reforge contributions
    pub base: bool,
    /// Exclude the global multiplier
    pub raw: bool,
    pub dungeon: bool,
}

impl StatQuery {
    pub fn base_raw(dungeon: bool) -> Self {
        Self {
            base: true,
            raw: true,
            dungeon,
        }
    }
}

/// Player data the optimizer depends on
///
/// Implemented by whatever resolved the player from the outside world; the
/// optimizer only ever reads through it.
pub trait PlayerProfile: Send + Sync {
    fn weapon(&self) -> Option<&Weapon>;

    /// Armor worn in `slot`, `None` when the slot is empty
    fn armor(&self, slot: EquipmentClass) -> Option<&ArmorPiece>;

    fn talisman_counts(&self) -> &BTreeMap<Rarity, u32>;

    /// Global stat multiplier
    fn stat_multiplier(&self) -> f64;

    fn stat(&self, stat: Stat, query: StatQuery) -> f64;

    fn weapon_damage(&self, query: StatQuery) -> f64;

    /// Stat scaling for an armor or weapon slot
    fn slot_scaling(&self, class: EquipmentClass) -> Option<&SlotScaling>;
}

/// Readings of one stat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatReadings {
    pub total: f64,
    pub base: f64,
    pub raw: f64,
    pub base_raw: f64,
}

impl StatReadings {
    pub fn uniform(value: f64) -> Self {
        Self {
            total: value,
            base: value,
            raw: value,
            base_raw: value,
        }
    }

    fn read(&self, query: StatQuery) -> f64 {
        match (query.base, query.raw) {
            (true, true) => self.base_raw,
            (true, false) => self.base,
            (false, true) => self.raw,
            (false, false) => self.total,
        }
    }
}

fn default_scaling() -> f64 {
    1.0
}

/// Serializable profile snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub armor: BTreeMap<EquipmentClass, ArmorPiece>,
    #[serde(default)]
    pub talismans: BTreeMap<Rarity, u32>,
    #[serde(default = "default_scaling")]
    pub multiplier: f64,
    #[serde(default)]
    pub stats: BTreeMap<String, StatReadings>,
    #[serde(default)]
    pub weapon_damage: StatReadings,
    #[serde(default)]
    pub slots: Vec<SlotScaling>,
    /// Factor applied to every stat reading in dungeon calculations
    #[serde(default = "default_scaling")]
    pub dungeon_scaling: f64,
}

impl ProfileSnapshot {
    pub fn new(weapon: Weapon) -> Self {
        Self {
            weapon: Some(weapon),
            armor: BTreeMap::new(),
            talismans: BTreeMap::new(),
            multiplier: 1.0,
            stats: BTreeMap::new(),
            weapon_damage: StatReadings::default(),
            slots: Vec::new(),
            dungeon_scaling: 1.0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn with_armor(mut self, slot: EquipmentClass, piece: ArmorPiece) -> Self {
        self.armor.insert(slot, piece);
        self
    }

    pub fn with_talismans(mut self, rarity: Rarity, count: u32) -> Self {
        self.talismans.insert(rarity, count);
        self
    }

    pub fn with_stat(mut self, stat: Stat, readings: StatReadings) -> Self {
        self.stats.insert(stat.key().to_string(), readings);
        self
    }

    pub fn with_weapon_damage(mut self, readings: StatReadings) -> Self {
        self.weapon_damage = readings;
        self
    }

    pub fn with_slot(mut self, scaling: SlotScaling) -> Self {
        self.slots.push(scaling);
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    fn dungeon_factor(&self, query: StatQuery) -> f64 {
        if query.dungeon {
            self.dungeon_scaling
        } else {
            1.0
        }
    }
}

impl PlayerProfile for ProfileSnapshot {
    fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    fn armor(&self, slot: EquipmentClass) -> Option<&ArmorPiece> {
        self.armor.get(&slot)
    }

    fn talisman_counts(&self) -> &BTreeMap<Rarity, u32> {
        &self.talismans
    }

    fn stat_multiplier(&self) -> f64 {
        self.multiplier
    }

    fn stat(&self, stat: Stat, query: StatQuery) -> f64 {
        let reading = self
            .stats
            .get(stat.key())
            .map(|r| r.read(query))
            .unwrap_or(0.0);
        reading * self.dungeon_factor(query)
    }

    fn weapon_damage(&self, query: StatQuery) -> f64 {
        self.weapon_damage.read(query) * self.dungeon_factor(query)
    }

    fn slot_scaling(&self, class: EquipmentClass) -> Option<&SlotScaling> {
        self.slots.iter().find(|slot| slot.class == class)
    }
}
