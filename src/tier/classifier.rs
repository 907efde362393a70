//! Listening-time tier classification.

use serde::{Deserialize, Serialize};

use crate::types::ItemKind;
use super::table::{ThresholdVariant, Tier, TierError, TierTables};

/// Classifies accumulated listening minutes into a [`Tier`].
///
/// Constructed explicitly with its threshold tables; holds no other state.
#[derive(Debug, Clone, Default)]
pub struct TierClassifier {
    tables: TierTables,
}

/// Where an item stands relative to its next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    /// Current tier.
    pub tier: Tier,
    /// Next tier, `None` at the top.
    pub next_tier: Option<Tier>,
    /// Minutes needed for `next_tier`.
    pub next_threshold: Option<u32>,
    /// Minutes still missing to reach `next_tier`.
    pub minutes_to_next: Option<u32>,
}

impl TierClassifier {
    /// Create a classifier over `tables`.
    pub fn new(tables: TierTables) -> Self {
        Self { tables }
    }

    /// Threshold tables in use.
    pub fn tables(&self) -> &TierTables {
        &self.tables
    }

    /// Tier for `total_minutes` of listening to an item of `kind`.
    ///
    /// Returns the tier of the highest threshold not exceeding
    /// `total_minutes` (reaching a threshold exactly counts), or
    /// [`Tier::None`] below the first threshold. Non-decreasing in
    /// `total_minutes`.
    pub fn classify(
        &self,
        total_minutes: u32,
        kind: ItemKind,
        variant: ThresholdVariant,
    ) -> Result<Tier, TierError> {
        let thresholds = self.thresholds(kind, variant)?;
        Ok(tier_for(total_minutes, thresholds))
    }

    /// Current tier plus distance to the next one.
    pub fn progress(
        &self,
        total_minutes: u32,
        kind: ItemKind,
        variant: ThresholdVariant,
    ) -> Result<TierProgress, TierError> {
        let thresholds = self.thresholds(kind, variant)?;
        let tier = tier_for(total_minutes, thresholds);
        // Threshold i unlocks tier i + 1, so the next tier's threshold sits at tier.index().
        let next_threshold = thresholds.get(tier.index()).copied();
        Ok(TierProgress {
            tier,
            next_tier: next_threshold.and_then(|_| tier.next()),
            next_threshold,
            minutes_to_next: next_threshold.map(|t| t.saturating_sub(total_minutes)),
        })
    }

    fn thresholds(&self, kind: ItemKind, variant: ThresholdVariant) -> Result<&[u32], TierError> {
        self.tables
            .get(variant)
            .thresholds(kind)
            .ok_or(TierError::MissingThresholds { kind, variant })
    }
}

fn tier_for(total_minutes: u32, thresholds: &[u32]) -> Tier {
    // Non-decreasing thresholds: everything before the partition point is met.
    let reached = thresholds.partition_point(|&t| t <= total_minutes);
    Tier::from_index(reached).unwrap_or(Tier::DarkMatter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::table::TierThresholdTable;

    fn classifier() -> TierClassifier {
        TierClassifier::new(TierTables::builtin())
    }

    #[test]
    fn test_below_first_threshold_is_none() {
        let tier = classifier().classify(59, ItemKind::Track, ThresholdVariant::Standard).unwrap();
        assert_eq!(tier, Tier::None);
        let tier = classifier().classify(0, ItemKind::Artist, ThresholdVariant::Low).unwrap();
        assert_eq!(tier, Tier::None);
    }

    #[test]
    fn test_meeting_threshold_counts() {
        let c = classifier();
        assert_eq!(c.classify(60, ItemKind::Track, ThresholdVariant::Standard).unwrap(), Tier::Bronze);
        assert_eq!(c.classify(149, ItemKind::Track, ThresholdVariant::Standard).unwrap(), Tier::Bronze);
        assert_eq!(c.classify(150, ItemKind::Track, ThresholdVariant::Standard).unwrap(), Tier::Silver);
    }

    #[test]
    fn test_track_standard_boundary_at_3000() {
        let c = classifier();
        let below = c.classify(2999, ItemKind::Track, ThresholdVariant::Standard).unwrap();
        let at = c.classify(3000, ItemKind::Track, ThresholdVariant::Standard).unwrap();
        assert_eq!(below.index(), 8);
        assert_eq!(below, Tier::Amethyst);
        assert_eq!(at.index(), 9);
        assert_eq!(at, Tier::Diamond);
    }

    #[test]
    fn test_top_tier_is_capped() {
        let c = classifier();
        let tier = c.classify(u32::MAX, ItemKind::Album, ThresholdVariant::Standard).unwrap();
        assert_eq!(tier, Tier::DarkMatter);
    }

    #[test]
    fn test_variants_differ() {
        let c = classifier();
        let low = c.classify(100, ItemKind::Track, ThresholdVariant::Low).unwrap();
        let standard = c.classify(100, ItemKind::Track, ThresholdVariant::Standard).unwrap();
        assert!(low > standard);
    }

    #[test]
    fn test_missing_kind_fails_fast() {
        let tracks_only = TierThresholdTable::from_pairs([(
            ItemKind::Track,
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        )])
        .unwrap();
        let c = TierClassifier::new(TierTables {
            low: tracks_only.clone(),
            standard: tracks_only,
        });

        let err = c.classify(10, ItemKind::Artist, ThresholdVariant::Standard).unwrap_err();
        assert_eq!(
            err,
            TierError::MissingThresholds {
                kind: ItemKind::Artist,
                variant: ThresholdVariant::Standard,
            }
        );
    }

    #[test]
    fn test_progress_mid_table() {
        let progress = classifier()
            .progress(2999, ItemKind::Track, ThresholdVariant::Standard)
            .unwrap();
        assert_eq!(progress.tier, Tier::Amethyst);
        assert_eq!(progress.next_tier, Some(Tier::Diamond));
        assert_eq!(progress.next_threshold, Some(3000));
        assert_eq!(progress.minutes_to_next, Some(1));
    }

    #[test]
    fn test_progress_from_none() {
        let progress = classifier()
            .progress(0, ItemKind::Track, ThresholdVariant::Standard)
            .unwrap();
        assert_eq!(progress.tier, Tier::None);
        assert_eq!(progress.next_tier, Some(Tier::Bronze));
        assert_eq!(progress.minutes_to_next, Some(60));
    }

    #[test]
    fn test_progress_at_top() {
        let progress = classifier()
            .progress(20000, ItemKind::Track, ThresholdVariant::Standard)
            .unwrap();
        assert_eq!(progress.tier, Tier::DarkMatter);
        assert_eq!(progress.next_tier, None);
        assert_eq!(progress.next_threshold, None);
        assert_eq!(progress.minutes_to_next, None);
    }
}
