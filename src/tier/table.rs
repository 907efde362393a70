//! Tier labels and listening-time threshold tables.
//!
//! Each item kind has exactly [`THRESHOLDS_PER_KIND`] non-decreasing minute
//! thresholds. Threshold `i` (0-based) unlocks tier `i + 1`; below the first
//! threshold an item has [`Tier::None`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::ItemKind;

/// Number of thresholds every item kind must define.
pub const THRESHOLDS_PER_KIND: usize = 11;

/// Prestige tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Below the first threshold.
    None,
    /// Tier 1.
    Bronze,
    /// Tier 2.
    Silver,
    /// Tier 3.
    Gold,
    /// Tier 4.
    Platinum,
    /// Tier 5.
    Sapphire,
    /// Tier 6.
    Emerald,
    /// Tier 7.
    Ruby,
    /// Tier 8.
    Amethyst,
    /// Tier 9.
    Diamond,
    /// Tier 10.
    Opal,
    /// Tier 11.
    DarkMatter,
}

impl Tier {
    /// All tiers, lowest first. `Tier::ALL[i].index() == i`.
    pub const ALL: [Tier; THRESHOLDS_PER_KIND + 1] = [
        Tier::None,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Sapphire,
        Tier::Emerald,
        Tier::Ruby,
        Tier::Amethyst,
        Tier::Diamond,
        Tier::Opal,
        Tier::DarkMatter,
    ];

    /// Index of the tier: 0 for `None`, 1..=11 for earned tiers.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Tier at `index`, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Next tier up, `None` at the top.
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Sapphire => "Sapphire",
            Self::Emerald => "Emerald",
            Self::Ruby => "Ruby",
            Self::Amethyst => "Amethyst",
            Self::Diamond => "Diamond",
            Self::Opal => "Opal",
            Self::DarkMatter => "Dark Matter",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which threshold table to classify against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdVariant {
    /// Small thresholds for testing and demos.
    Low,
    /// Production thresholds.
    #[default]
    Standard,
}

impl fmt::Display for ThresholdVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

impl FromStr for ThresholdVariant {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "standard" => Ok(Self::Standard),
            other => Err(TierError::UnknownVariant(other.to_string())),
        }
    }
}

/// Error type for tier configuration and classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TierError {
    /// No thresholds configured for a kind.
    #[error("No {variant} tier thresholds configured for item kind {kind}")]
    MissingThresholds {
        /// Kind that was looked up.
        kind: ItemKind,
        /// Variant that was looked up.
        variant: ThresholdVariant,
    },
    /// A threshold list has the wrong length or decreases.
    #[error("Invalid tier thresholds for {kind}: {reason}")]
    InvalidTable {
        /// Kind with the bad list.
        kind: ItemKind,
        /// What is wrong with it.
        reason: String,
    },
    /// Unrecognized threshold variant name.
    #[error("Unknown threshold variant: {0:?}")]
    UnknownVariant(String),
}

/// Minute thresholds per item kind for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<ItemKind, Vec<u32>>", into = "BTreeMap<ItemKind, Vec<u32>>")]
pub struct TierThresholdTable {
    thresholds: BTreeMap<ItemKind, Vec<u32>>,
}

impl TierThresholdTable {
    /// Build a table, validating every threshold list.
    pub fn new(thresholds: BTreeMap<ItemKind, Vec<u32>>) -> Result<Self, TierError> {
        for (kind, values) in &thresholds {
            validate_thresholds(*kind, values)?;
        }
        Ok(Self { thresholds })
    }

    /// Build a table from `(kind, thresholds)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, TierError>
    where
        I: IntoIterator<Item = (ItemKind, Vec<u32>)>,
    {
        Self::new(pairs.into_iter().collect())
    }

    /// Thresholds for `kind`, lowest first.
    pub fn thresholds(&self, kind: ItemKind) -> Option<&[u32]> {
        self.thresholds.get(&kind).map(Vec::as_slice)
    }

    /// Kinds with configured thresholds.
    pub fn kinds(&self) -> impl Iterator<Item = ItemKind> + '_ {
        self.thresholds.keys().copied()
    }

    /// Production thresholds.
    pub fn standard() -> Self {
        Self {
            thresholds: BTreeMap::from([
                (ItemKind::Track, vec![60, 150, 300, 500, 800, 1200, 1600, 2200, 3000, 6000, 15000]),
                (ItemKind::Album, vec![200, 500, 1000, 2000, 3500, 5000, 7000, 10000, 15000, 30000, 60000]),
                (ItemKind::Artist, vec![400, 1000, 2000, 4000, 7000, 10000, 15000, 20000, 30000, 60000, 120000]),
            ]),
        }
    }

    /// Low thresholds for exercising every tier quickly.
    pub fn low() -> Self {
        Self {
            thresholds: BTreeMap::from([
                (ItemKind::Track, vec![1, 2, 3, 5, 8, 12, 16, 22, 30, 60, 150]),
                (ItemKind::Album, vec![2, 5, 10, 20, 35, 50, 70, 100, 150, 300, 600]),
                (ItemKind::Artist, vec![4, 10, 20, 40, 70, 100, 150, 200, 300, 600, 1200]),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<ItemKind, Vec<u32>>> for TierThresholdTable {
    type Error = TierError;

    fn try_from(thresholds: BTreeMap<ItemKind, Vec<u32>>) -> Result<Self, Self::Error> {
        Self::new(thresholds)
    }
}

impl From<TierThresholdTable> for BTreeMap<ItemKind, Vec<u32>> {
    fn from(table: TierThresholdTable) -> Self {
        table.thresholds
    }
}

fn validate_thresholds(kind: ItemKind, values: &[u32]) -> Result<(), TierError> {
    if values.len() != THRESHOLDS_PER_KIND {
        return Err(TierError::InvalidTable {
            kind,
            reason: format!(
                "expected {} thresholds, found {}",
                THRESHOLDS_PER_KIND,
                values.len()
            ),
        });
    }
    if let Some(i) = values.windows(2).position(|w| w[0] > w[1]) {
        return Err(TierError::InvalidTable {
            kind,
            reason: format!(
                "threshold {} ({}) is greater than threshold {} ({})",
                i,
                values[i],
                i + 1,
                values[i + 1]
            ),
        });
    }
    Ok(())
}

/// Both selectable threshold variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTables {
    /// Testing thresholds.
    pub low: TierThresholdTable,
    /// Production thresholds.
    pub standard: TierThresholdTable,
}

impl TierTables {
    /// Built-in low and standard tables.
    pub fn builtin() -> Self {
        Self {
            low: TierThresholdTable::low(),
            standard: TierThresholdTable::standard(),
        }
    }

    /// Table for `variant`.
    pub fn get(&self, variant: ThresholdVariant) -> &TierThresholdTable {
        match variant {
            ThresholdVariant::Low => &self.low,
            ThresholdVariant::Standard => &self.standard,
        }
    }
}

impl Default for TierTables {
    fn default() -> Self {
        Self::builtin()
    }
}
