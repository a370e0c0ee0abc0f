// Inventory snapshot: owned item counts per (equipment class, rarity)

use std::collections::BTreeMap;

use super::profile::PlayerProfile;
use super::value_objects::{EquipmentClass, Rarity};

/// Owned item counts, derived once from the player profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryCounts {
    counts: BTreeMap<(EquipmentClass, Rarity), u32>,
}

impl InventoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Talismans, the equipped weapon, and each equipped armor piece
    ///
    /// Returns `None` when the profile has no weapon.
    pub fn from_profile(profile: &dyn PlayerProfile) -> Option<Self> {
        let weapon = profile.weapon()?;
        let mut inventory = Self::new();

        for (&rarity, &count) in profile.talisman_counts() {
            inventory.add(EquipmentClass::Talisman, rarity, count);
        }
        inventory.add(weapon.class, weapon.rarity, 1);
        for slot in EquipmentClass::ARMOR_SLOTS {
            if let Some(piece) = profile.armor(slot) {
                inventory.add(slot, piece.rarity, 1);
            }
        }

        Some(inventory)
    }

    pub fn add(&mut self, class: EquipmentClass, rarity: Rarity, count: u32) {
        *self.counts.entry((class, rarity)).or_insert(0) += count;
    }

    pub fn with(mut self, class: EquipmentClass, rarity: Rarity, count: u32) -> Self {
        self.add(class, rarity, count);
        self
    }

    pub fn count(&self, class: EquipmentClass, rarity: Rarity) -> u32 {
        self.counts.get(&(class, rarity)).copied().unwrap_or(0)
    }

    /// Buckets holding at least one item, in class then rarity order
    pub fn non_empty(&self) -> impl Iterator<Item = (EquipmentClass, Rarity, u32)> + '_ {
        self.counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&(class, rarity), &count)| (class, rarity, count))
    }

    /// Classes with at least one owned item
    pub fn classes(&self) -> Vec<EquipmentClass> {
        let mut classes: Vec<_> = self.non_empty().map(|(class, _, _)| class).collect();
        classes.dedup();
        classes
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}
