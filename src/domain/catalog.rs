// Reforge catalog: per catalog key, per reforge, per rarity stat bonuses
// Loaded once and shared read-only; per-call restrictions are views over it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::value_objects::{CatalogKey, Rarity, Stat};

/// Error raised while loading catalogs or profiles from disk
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One reforge and its stat bonuses per rarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReforgeDefinition {
    #[serde(skip)]
    pub name: String,
    /// Obtainable from the blacksmith
    #[serde(default)]
    pub blacksmith: bool,
    /// Internal name of the weapon this reforge requires, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_weapon: Option<String>,
    #[serde(default)]
    pub bonuses: BTreeMap<Rarity, BTreeMap<String, f64>>,
}

impl ReforgeDefinition {
    pub fn new(name: impl Into<String>, blacksmith: bool) -> Self {
        Self {
            name: name.into(),
            blacksmith,
            requires_weapon: None,
            bonuses: BTreeMap::new(),
        }
    }

    pub fn requiring_weapon(mut self, internal_name: impl Into<String>) -> Self {
        self.requires_weapon = Some(internal_name.into());
        self
    }

    pub fn with_bonus(mut self, rarity: Rarity, stat: Stat, value: f64) -> Self {
        self.bonuses
            .entry(rarity)
            .or_default()
            .insert(stat.key().to_string(), value);
        self
    }

    /// Whether the bonus table has an entry for `rarity`
    pub fn supports(&self, rarity: Rarity) -> bool {
        self.bonuses.contains_key(&rarity)
    }

    /// Bonus for `stat` at `rarity`, zero when absent
    pub fn bonus(&self, rarity: Rarity, stat: Stat) -> f64 {
        self.bonuses
            .get(&rarity)
            .and_then(|stats| stats.get(stat.key()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Immutable reforge table keyed by catalog key and reforge name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReforgeCatalog {
    entries: BTreeMap<CatalogKey, BTreeMap<String, ReforgeDefinition>>,
}

impl ReforgeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reforge(mut self, key: CatalogKey, reforge: ReforgeDefinition) -> Self {
        self.insert(key, reforge);
        self
    }

    pub fn insert(&mut self, key: CatalogKey, reforge: ReforgeDefinition) {
        self.entries
            .entry(key)
            .or_default()
            .insert(reforge.name.clone(), reforge);
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: ReforgeCatalog = serde_json::from_str(json)?;
        for reforges in catalog.entries.values_mut() {
            for (name, reforge) in reforges.iter_mut() {
                reforge.name = name.clone();
            }
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn reforges(&self, key: CatalogKey) -> impl Iterator<Item = &ReforgeDefinition> {
        self.entries.get(&key).into_iter().flat_map(|m| m.values())
    }

    pub fn get(&self, key: CatalogKey, name: &str) -> Option<&ReforgeDefinition> {
        self.entries.get(&key).and_then(|m| m.get(name))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-call view with the reforges unavailable to this player hidden
    ///
    /// Outside restricted mode, reforges requiring a weapon other than
    /// `weapon_internal_name` are hidden. In restricted mode only blacksmith
    /// reforges are visible. The catalog itself is never modified.
    pub fn restricted_for(&self, weapon_internal_name: &str, only_blacksmith: bool) -> ReforgeView<'_> {
        let mut hidden = BTreeSet::new();
        for (key, reforges) in &self.entries {
            for reforge in reforges.values() {
                let missing_weapon = !only_blacksmith
                    && reforge
                        .requires_weapon
                        .as_deref()
                        .is_some_and(|required| required != weapon_internal_name);
                if missing_weapon {
                    hidden.insert((*key, reforge.name.as_str()));
                }
            }
        }

        ReforgeView {
            catalog: self,
            hidden,
            only_blacksmith,
        }
    }
}

/// Filtered, borrowed view of a [`ReforgeCatalog`] for one optimization call
#[derive(Debug, Clone)]
pub struct ReforgeView<'a> {
    catalog: &'a ReforgeCatalog,
    hidden: BTreeSet<(CatalogKey, &'a str)>,
    only_blacksmith: bool,
}

impl<'a> ReforgeView<'a> {
    pub fn only_blacksmith(&self) -> bool {
        self.only_blacksmith
    }

    pub fn reforges(&self, key: CatalogKey) -> impl Iterator<Item = &'a ReforgeDefinition> + '_ {
        self.catalog
            .reforges(key)
            .filter(move |reforge| self.is_visible(key, reforge))
    }

    pub fn get(&self, key: CatalogKey, name: &str) -> Option<&'a ReforgeDefinition> {
        self.catalog
            .get(key, name)
            .filter(|reforge| self.is_visible(key, reforge))
    }

    fn is_visible(&self, key: CatalogKey, reforge: &ReforgeDefinition) -> bool {
        if self.only_blacksmith && !reforge.blacksmith {
            return false;
        }
        !self.hidden.contains(&(key, reforge.name.as_str()))
    }
}
