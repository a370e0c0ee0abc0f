// Domain value objects representing core business concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of decision variable in the optimization model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::LessThanOrEqual => write!(f, "<="),
            ConstraintType::Equal => write!(f, "=="),
            ConstraintType::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of the optimization solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Found feasible solution (may not be optimal)
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached
    TimeLimit,
    /// Iteration limit reached
    IterationLimit,
    /// Solver error occurred
    Error,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Feasible => write!(f, "Feasible"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
            SolutionStatus::IterationLimit => write!(f, "Iteration Limit Reached"),
            SolutionStatus::Error => write!(f, "Error"),
        }
    }
}

/// MILP backend used underneath the nonlinear solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    /// Automatically select best available backend
    Auto,
    /// Pure Rust microlp backend (through good_lp)
    MicroLp,
    /// HiGHS backend (requires the `highs` feature)
    Highs,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::MicroLp => write!(f, "microlp"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}

impl std::str::FromStr for SolverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SolverBackend::Auto),
            "microlp" => Ok(SolverBackend::MicroLp),
            "highs" => Ok(SolverBackend::Highs),
            other => Err(format!("unknown solver backend '{}'", other)),
        }
    }
}

/// Item quality tier; selects which reforge bonus values apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory bucket an item belongs to
///
/// Armor pieces stay distinct buckets but share the `armor` catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentClass {
    Talisman,
    Sword,
    Bow,
    FishingRod,
    Dagger,
    Helmet,
    Chestplate,
    Leggings,
    Boots,
}

impl EquipmentClass {
    pub const ARMOR_SLOTS: [EquipmentClass; 4] = [
        EquipmentClass::Helmet,
        EquipmentClass::Chestplate,
        EquipmentClass::Leggings,
        EquipmentClass::Boots,
    ];

    pub fn catalog_key(&self) -> CatalogKey {
        match self {
            EquipmentClass::Talisman => CatalogKey::Talisman,
            EquipmentClass::Sword => CatalogKey::Sword,
            EquipmentClass::Bow => CatalogKey::Bow,
            EquipmentClass::FishingRod => CatalogKey::FishingRod,
            EquipmentClass::Dagger => CatalogKey::Dagger,
            EquipmentClass::Helmet
            | EquipmentClass::Chestplate
            | EquipmentClass::Leggings
            | EquipmentClass::Boots => CatalogKey::Armor,
        }
    }

    pub fn is_armor(&self) -> bool {
        self.catalog_key() == CatalogKey::Armor
    }

    pub fn is_weapon(&self) -> bool {
        matches!(
            self,
            EquipmentClass::Sword
                | EquipmentClass::Bow
                | EquipmentClass::FishingRod
                | EquipmentClass::Dagger
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentClass::Talisman => "talisman",
            EquipmentClass::Sword => "sword",
            EquipmentClass::Bow => "bow",
            EquipmentClass::FishingRod => "fishing rod",
            EquipmentClass::Dagger => "dagger",
            EquipmentClass::Helmet => "helmet",
            EquipmentClass::Chestplate => "chestplate",
            EquipmentClass::Leggings => "leggings",
            EquipmentClass::Boots => "boots",
        }
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reforge catalog lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKey {
    Talisman,
    Sword,
    Bow,
    FishingRod,
    Dagger,
    Armor,
}

/// Stats the damage model reads from the catalog and the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stat {
    Strength,
    CritDamage,
    CritChance,
    AttackSpeed,
    /// Weapon damage
    Damage,
}

impl Stat {
    /// Stat name as it appears in catalog bonus tables
    pub fn key(&self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::CritDamage => "crit damage",
            Stat::CritChance => "crit chance",
            Stat::AttackSpeed => "attack speed",
            Stat::Damage => "damage",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
