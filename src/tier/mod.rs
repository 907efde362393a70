//! Tier classification from accumulated listening time.

pub mod table;
pub mod classifier;

pub use table::{Tier, ThresholdVariant, TierThresholdTable, TierTables, TierError, THRESHOLDS_PER_KIND};
pub use classifier::{TierClassifier, TierProgress};
