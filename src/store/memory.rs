//! In-memory ranking store for tests and the interactive host.

use std::collections::BTreeMap;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::ranking::{Partition, PartitionError};
use crate::types::{
    AlbumId, CategoryId, ComparisonResult, ItemId, ItemKind, PartitionKey, PartitionScope,
    PartitionSnapshot, RankedItem, RankingWrite,
};
use super::RankingStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InMemoryError {
    /// The write was computed against an ordering that has since changed.
    #[error("Stale snapshot for {scope}: write expected {expected}, store has {found}")]
    StaleSnapshot {
        /// Scope of the write.
        scope: PartitionScope,
        /// Fingerprint the write was based on.
        expected: String,
        /// Fingerprint of the stored ordering.
        found: String,
    },
    /// Item not found.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    /// Item is already ranked and the write does not move it.
    #[error("Item {item_id} is already ranked in category {category_id}")]
    AlreadyRanked {
        /// Item.
        item_id: ItemId,
        /// Category it is ranked in.
        category_id: CategoryId,
    },
    /// Track does not belong to the album it is being ranked in.
    #[error("Track {item_id} does not belong to album {album_id}")]
    AlbumMismatch {
        /// Track.
        item_id: ItemId,
        /// Album of the write.
        album_id: AlbumId,
    },
    /// Category write without a personal score.
    #[error("Write for item {0} carries no personal score")]
    MissingScore(ItemId),
    /// Partition invariant violated.
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

#[derive(Debug, Default)]
struct Inner {
    partitions: BTreeMap<PartitionKey, Partition>,
    comparisons: Vec<ComparisonResult>,
}

impl Inner {
    fn locate(&self, item_id: &ItemId, kind: ItemKind) -> Option<(&PartitionKey, &RankedItem)> {
        self.partitions
            .iter()
            .filter(|(key, _)| key.item_kind == kind)
            .find_map(|(key, partition)| partition.get(item_id).map(|item| (key, item)))
    }

    fn snapshot(&self, scope: &PartitionScope) -> PartitionSnapshot {
        match scope {
            PartitionScope::Category(key) => self
                .partitions
                .get(key)
                .map(Partition::snapshot)
                .unwrap_or_else(|| PartitionSnapshot::empty(scope.clone())),
            PartitionScope::Album { .. } => {
                let tracks = self
                    .partitions
                    .values()
                    .flat_map(|partition| partition.items())
                    .filter(|item| scope.contains(item))
                    .cloned()
                    .collect();
                PartitionSnapshot::new(scope.clone(), tracks)
            }
        }
    }

    fn check_fingerprint(&self, write: &RankingWrite) -> Result<(), InMemoryError> {
        let found = self.snapshot(&write.scope).fingerprint().to_string();
        if found != write.base_fingerprint {
            tracing::warn!(
                session_id = %write.session_id,
                scope = %write.scope,
                expected = %write.base_fingerprint,
                found = %found,
                "Rejecting write computed from a stale snapshot"
            );
            return Err(InMemoryError::StaleSnapshot {
                scope: write.scope.clone(),
                expected: write.base_fingerprint.clone(),
                found,
            });
        }
        Ok(())
    }

    fn apply_category(&mut self, key: &PartitionKey, write: &RankingWrite) -> Result<(), InMemoryError> {
        let mut item = write
            .to_ranked_item()
            .ok_or_else(|| InMemoryError::MissingScore(write.item_id.clone()))?;

        let existing = self
            .locate(&write.item_id, write.item_kind)
            .map(|(k, i)| (k.clone(), i.clone()));

        // Work on copies so a failure leaves the store untouched.
        let mut source: Option<Partition> = None;
        match (&write.previous_category, existing) {
            (None, None) => {}
            (Some(previous), Some((from_key, old)))
                if &from_key.category_id == previous && &from_key != key =>
            {
                item.album_id = item.album_id.or(old.album_id);
                item.rank_within_album = old.rank_within_album;
                let mut from = self
                    .partitions
                    .get(&from_key)
                    .cloned()
                    .ok_or_else(|| InMemoryError::ItemNotFound(write.item_id.clone()))?;
                from.remove(&write.item_id)?;
                source = Some(from);
            }
            (_, Some((from_key, _))) => {
                return Err(InMemoryError::AlreadyRanked {
                    item_id: write.item_id.clone(),
                    category_id: from_key.category_id,
                });
            }
            (Some(_), None) => return Err(InMemoryError::ItemNotFound(write.item_id.clone())),
        }

        let mut target = self
            .partitions
            .get(key)
            .cloned()
            .unwrap_or_else(|| Partition::new(key.clone()));
        target.insert_at(write.position, item)?;

        if let Some(from) = source {
            if from.is_empty() {
                self.partitions.remove(from.key());
            } else {
                self.partitions.insert(from.key().clone(), from);
            }
        }
        self.partitions.insert(key.clone(), target);
        Ok(())
    }

    fn apply_album(&mut self, album_id: &AlbumId, write: &RankingWrite) -> Result<(), InMemoryError> {
        let len = self.snapshot(&write.scope).len();
        if write.position > len {
            return Err(PartitionError::PositionOutOfRange {
                position: write.position,
                len,
            }
            .into());
        }

        let (key, track) = self
            .locate(&write.item_id, ItemKind::Track)
            .ok_or_else(|| InMemoryError::ItemNotFound(write.item_id.clone()))?;
        if track.album_id.as_ref() != Some(album_id) {
            return Err(InMemoryError::AlbumMismatch {
                item_id: write.item_id.clone(),
                album_id: album_id.clone(),
            });
        }
        if track.rank_within_album.is_some() {
            return Err(InMemoryError::AlreadyRanked {
                item_id: write.item_id.clone(),
                category_id: key.category_id.clone(),
            });
        }

        for partition in self.partitions.values_mut() {
            for track in partition.album_tracks_mut(album_id) {
                if track.item_id == write.item_id {
                    track.rank_within_album = Some(write.position);
                } else if let Some(rank) = track.rank_within_album.as_mut() {
                    if *rank >= write.position {
                        *rank += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn remove(&mut self, item_id: &ItemId, kind: ItemKind) -> Result<RankedItem, InMemoryError> {
        let key = self
            .locate(item_id, kind)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| InMemoryError::ItemNotFound(item_id.clone()))?;
        let partition = self
            .partitions
            .get_mut(&key)
            .ok_or_else(|| InMemoryError::ItemNotFound(item_id.clone()))?;

        let removed = partition.remove(item_id)?;
        if partition.is_empty() {
            self.partitions.remove(&key);
        }

        if let (Some(album_id), Some(removed_rank)) = (&removed.album_id, removed.rank_within_album) {
            for partition in self.partitions.values_mut() {
                for track in partition.album_tracks_mut(album_id) {
                    if let Some(rank) = track.rank_within_album.as_mut() {
                        if *rank > removed_rank {
                            *rank -= 1;
                        }
                    }
                }
            }
        }
        Ok(removed)
    }
}

/// In-memory ranking store.
///
/// Uses BTreeMap for deterministic iteration order. All writes happen under
/// one lock, so each [`RankingWrite`] is applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryRankingStore {
    inner: RwLock<Inner>,
}

impl InMemoryRankingStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with already-ranked items.
    ///
    /// Items are grouped by partition; each partition must have dense
    /// positions.
    pub fn with_items(items: Vec<RankedItem>) -> Result<Self, InMemoryError> {
        let mut grouped: BTreeMap<PartitionKey, Vec<RankedItem>> = BTreeMap::new();
        for item in items {
            grouped.entry(item.partition_key()).or_default().push(item);
        }

        let mut partitions = BTreeMap::new();
        for (key, items) in grouped {
            let partition = Partition::from_items(key.clone(), items)?;
            partitions.insert(key, partition);
        }

        Ok(Self {
            inner: RwLock::new(Inner {
                partitions,
                comparisons: Vec::new(),
            }),
        })
    }

    /// Copy of the partition behind `key`, if it has any items.
    pub fn partition(&self, key: &PartitionKey) -> Option<Partition> {
        self.inner.read().partitions.get(key).cloned()
    }

    /// Number of ranked items across all partitions.
    pub fn num_items(&self) -> usize {
        self.inner.read().partitions.values().map(Partition::len).sum()
    }

    /// Every ranked item, grouped by partition and ordered best first.
    ///
    /// Feeding the result back into [`Self::with_items`] rebuilds the same store
    /// minus the comparison log.
    pub fn all_items(&self) -> Vec<RankedItem> {
        self.inner
            .read()
            .partitions
            .values()
            .flat_map(|partition| partition.items().iter().cloned())
            .collect()
    }

    /// Every stored comparison, oldest first.
    pub fn all_comparisons(&self) -> Vec<ComparisonResult> {
        self.inner.read().comparisons.clone()
    }
}

#[async_trait]
impl RankingStore for InMemoryRankingStore {
    type Error = InMemoryError;

    async fn load_partition(&self, scope: &PartitionScope) -> Result<PartitionSnapshot, Self::Error> {
        Ok(self.inner.read().snapshot(scope))
    }

    async fn find_item(&self, item_id: &ItemId, kind: ItemKind) -> Result<Option<RankedItem>, Self::Error> {
        Ok(self.inner.read().locate(item_id, kind).map(|(_, item)| item.clone()))
    }

    async fn apply(&self, write: &RankingWrite) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        inner.check_fingerprint(write)?;

        match &write.scope {
            PartitionScope::Category(key) => inner.apply_category(key, write)?,
            PartitionScope::Album { album_id } => inner.apply_album(album_id, write)?,
        }
        inner.comparisons.extend(write.comparison_history.iter().cloned());

        tracing::info!(
            session_id = %write.session_id,
            item_id = %write.item_id,
            scope = %write.scope,
            position = write.position,
            comparisons = write.comparison_history.len(),
            "Ranking write applied"
        );
        Ok(())
    }

    async fn remove(&self, item_id: &ItemId, kind: ItemKind) -> Result<RankedItem, Self::Error> {
        let removed = self.inner.write().remove(item_id, kind)?;
        tracing::info!(
            item_id = %item_id,
            category_id = %removed.category_id,
            position = removed.position,
            "Ranked item removed"
        );
        Ok(removed)
    }

    async fn comparisons_for(&self, item_id: &ItemId) -> Result<Vec<ComparisonResult>, Self::Error> {
        Ok(self
            .inner
            .read()
            .comparisons
            .iter()
            .filter(|c| &c.new_item_id == item_id || &c.candidate_item_id == item_id)
            .cloned()
            .collect())
    }
}
