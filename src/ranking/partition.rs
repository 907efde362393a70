//! Ordered, densely indexed ranking partitions.
//!
//! A [`Partition`] holds the ranked items of one `(category, kind)` pair,
//! best first. Positions always form the dense sequence `0..len`, and
//! personal scores strictly decrease along it.

use std::collections::BTreeSet;

use crate::types::{AlbumId, ItemId, PartitionKey, PartitionScope, PartitionSnapshot, RankedItem};

/// Error type for partition operations and snapshot validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    /// The same item appears twice.
    #[error("Item {0} appears more than once in the partition")]
    DuplicateItem(ItemId),
    /// Ranks do not form the sequence `0..len`.
    #[error("Expected rank {expected} for item {item_id}, found {found:?}")]
    NonDenseRanks {
        /// Offending item.
        item_id: ItemId,
        /// Rank the item should have at its sorted index.
        expected: usize,
        /// Rank it actually has.
        found: Option<usize>,
    },
    /// An item that does not belong to the partition's scope.
    #[error("Item {item_id} does not belong to {scope}")]
    ForeignItem {
        /// Offending item.
        item_id: ItemId,
        /// Scope it was checked against.
        scope: PartitionScope,
    },
    /// Insert position past the end of the partition.
    #[error("Position {position} is out of range for a partition of {len} items")]
    PositionOutOfRange {
        /// Requested position.
        position: usize,
        /// Partition size.
        len: usize,
    },
    /// Item to remove is not in the partition.
    #[error("Item {0} is not in the partition")]
    ItemNotFound(ItemId),
    /// Stored scores do not strictly decrease along positions.
    #[error("Score {score} of item {item_id} at position {position} breaks descending score order")]
    ScoresOutOfOrder {
        /// First item whose score is not finite or not below its predecessor's.
        item_id: ItemId,
        /// Its position.
        position: usize,
        /// Its score.
        score: f64,
    },
    /// Inserted score would break score ordering.
    #[error("Score {score} of item {item_id} does not fit at position {position}")]
    ScoreOutOfOrder {
        /// Offending item.
        item_id: ItemId,
        /// Requested position.
        position: usize,
        /// Its score.
        score: f64,
    },
}

/// Check that `sorted` (already ordered by rank) is a well-formed snapshot of `scope`.
///
/// Every item must belong to `scope`, appear once, and carry the rank equal
/// to its index. In scored scopes, personal scores must be finite and
/// strictly decreasing.
pub fn validate_ranks(scope: &PartitionScope, sorted: &[RankedItem]) -> Result<(), PartitionError> {
    let mut seen: BTreeSet<&ItemId> = BTreeSet::new();
    for (expected, item) in sorted.iter().enumerate() {
        if !scope.contains(item) {
            return Err(PartitionError::ForeignItem {
                item_id: item.item_id.clone(),
                scope: scope.clone(),
            });
        }
        if !seen.insert(&item.item_id) {
            return Err(PartitionError::DuplicateItem(item.item_id.clone()));
        }
        let found = scope.rank_of(item);
        if found != Some(expected) {
            return Err(PartitionError::NonDenseRanks {
                item_id: item.item_id.clone(),
                expected,
                found,
            });
        }
    }

    if scope.is_scored() {
        let mut above: Option<f64> = None;
        for (position, item) in sorted.iter().enumerate() {
            let score = item.personal_score;
            if !score.is_finite() || above.map_or(false, |a| score >= a) {
                return Err(PartitionError::ScoresOutOfOrder {
                    item_id: item.item_id.clone(),
                    position,
                    score,
                });
            }
            above = Some(score);
        }
    }
    Ok(())
}

/// Ranked items of one `(category, kind)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    key: PartitionKey,
    items: Vec<RankedItem>,
}

impl Partition {
    /// Create an empty partition.
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    /// Build a partition from stored items, validating positions.
    pub fn from_items(key: PartitionKey, mut items: Vec<RankedItem>) -> Result<Self, PartitionError> {
        items.sort_by_key(|item| item.position);
        validate_ranks(&PartitionScope::Category(key.clone()), &items)?;
        Ok(Self { key, items })
    }

    /// Partition key.
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Scope for sessions against this partition.
    pub fn scope(&self) -> PartitionScope {
        PartitionScope::Category(self.key.clone())
    }

    /// Items, best first.
    pub fn items(&self) -> &[RankedItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of `item_id`, if present.
    pub fn position_of(&self, item_id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.item_id == item_id)
    }

    /// Item with `item_id`, if present.
    pub fn get(&self, item_id: &ItemId) -> Option<&RankedItem> {
        self.items.iter().find(|item| &item.item_id == item_id)
    }

    /// Immutable snapshot for an insertion session.
    pub fn snapshot(&self) -> PartitionSnapshot {
        PartitionSnapshot::new(self.scope(), self.items.clone())
    }

    /// Fingerprint of the current membership and ordering.
    pub fn fingerprint(&self) -> String {
        PartitionSnapshot::compute_fingerprint(&self.scope(), &self.items)
    }

    /// Insert `item` at `position`, shifting everything at or after it down one place.
    ///
    /// The item's score must fit strictly between its new neighbours; no
    /// other score is touched.
    pub fn insert_at(&mut self, position: usize, mut item: RankedItem) -> Result<(), PartitionError> {
        if position > self.items.len() {
            return Err(PartitionError::PositionOutOfRange {
                position,
                len: self.items.len(),
            });
        }
        if item.category_id != self.key.category_id || item.item_kind != self.key.item_kind {
            return Err(PartitionError::ForeignItem {
                item_id: item.item_id,
                scope: self.scope(),
            });
        }
        if self.position_of(&item.item_id).is_some() {
            return Err(PartitionError::DuplicateItem(item.item_id));
        }

        let above = position.checked_sub(1).map(|i| self.items[i].personal_score);
        let below = self.items.get(position).map(|i| i.personal_score);
        let fits = above.map_or(true, |a| item.personal_score < a)
            && below.map_or(true, |b| item.personal_score > b);
        if !fits {
            return Err(PartitionError::ScoreOutOfOrder {
                item_id: item.item_id,
                position,
                score: item.personal_score,
            });
        }

        item.position = position;
        self.items.insert(position, item);
        self.reindex_from(position + 1);
        Ok(())
    }

    /// Remove `item_id`, compacting the positions after it. Scores are untouched.
    pub fn remove(&mut self, item_id: &ItemId) -> Result<RankedItem, PartitionError> {
        let position = self
            .position_of(item_id)
            .ok_or_else(|| PartitionError::ItemNotFound(item_id.clone()))?;
        let removed = self.items.remove(position);
        self.reindex_from(position);
        Ok(removed)
    }

    /// Tracks of `album_id` in this partition, for within-album rank updates.
    ///
    /// Callers may only touch `rank_within_album`; positions and scores are
    /// owned by `insert_at` and `remove`.
    pub(crate) fn album_tracks_mut<'a>(
        &'a mut self,
        album_id: &'a AlbumId,
    ) -> impl Iterator<Item = &'a mut RankedItem> + 'a {
        self.items
            .iter_mut()
            .filter(move |item| item.album_id.as_ref() == Some(album_id))
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, item) in self.items[start..].iter_mut().enumerate() {
            item.position = start + offset;
        }
    }
}
