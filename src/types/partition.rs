//! Partition keys and immutable partition snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonical_hash_hex;
use super::item::{AlbumId, CategoryId, ItemId, ItemKind, RankedItem};

/// Key of a ranking partition: the `(category, kind)` pair items are ranked in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    /// Rating bucket.
    pub category_id: CategoryId,
    /// Kind of the ranked entities.
    pub item_kind: ItemKind,
}

impl PartitionKey {
    /// Create a partition key.
    pub fn new(category_id: CategoryId, item_kind: ItemKind) -> Self {
        Self {
            category_id,
            item_kind,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category_id, self.item_kind)
    }
}

/// Ordering an insertion session runs against.
///
/// `Category` ranks by `position` inside a `(category, kind)` partition.
/// `Album` ranks tracks of one album by `rank_within_album`, independent of
/// the categories those tracks live in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum PartitionScope {
    /// Category ranking.
    Category(PartitionKey),
    /// Within-album track ranking.
    Album {
        /// Album whose tracks are ranked.
        album_id: AlbumId,
    },
}

impl PartitionScope {
    /// Category scope for a `(category, kind)` pair.
    pub fn category(category_id: CategoryId, item_kind: ItemKind) -> Self {
        Self::Category(PartitionKey::new(category_id, item_kind))
    }

    /// Within-album scope.
    pub fn album(album_id: AlbumId) -> Self {
        Self::Album { album_id }
    }

    /// Rank of `item` under this scope, if it has one.
    pub fn rank_of(&self, item: &RankedItem) -> Option<usize> {
        match self {
            Self::Category(_) => Some(item.position),
            Self::Album { .. } => item.rank_within_album,
        }
    }

    /// Whether `item` belongs to this scope at all.
    pub fn contains(&self, item: &RankedItem) -> bool {
        match self {
            Self::Category(key) => {
                item.category_id == key.category_id && item.item_kind == key.item_kind
            }
            Self::Album { album_id } => {
                item.item_kind == ItemKind::Track
                    && item.album_id.as_ref() == Some(album_id)
                    && item.rank_within_album.is_some()
            }
        }
    }

    /// Whether items in this scope carry a personal score derived from rank.
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Category(_))
    }
}

impl fmt::Display for PartitionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(key) => write!(f, "category:{}", key),
            Self::Album { album_id } => write!(f, "album:{}", album_id),
        }
    }
}

/// Immutable snapshot of a partition, sorted best first.
///
/// A snapshot is taken once per insertion session and never re-sorted or
/// refreshed while the session runs. The `fingerprint` identifies the exact
/// membership and ordering the snapshot was taken from, so a store can reject
/// writes computed against a stale view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSnapshot {
    scope: PartitionScope,
    items: Vec<RankedItem>,
    fingerprint: String,
}

/// Fingerprint input: scope plus `(item, rank)` pairs in rank order.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    scope: &'a PartitionScope,
    ranks: Vec<(&'a ItemId, Option<usize>)>,
}

impl PartitionSnapshot {
    /// Build a snapshot, sorting `items` by their rank under `scope`.
    ///
    /// Sorting is stable, so duplicate ranks keep their input order; the
    /// insertion engine rejects such snapshots at session start.
    pub fn new(scope: PartitionScope, mut items: Vec<RankedItem>) -> Self {
        items.sort_by_key(|item| scope.rank_of(item));
        let fingerprint = Self::compute_fingerprint(&scope, &items);
        Self {
            scope,
            items,
            fingerprint,
        }
    }

    /// Empty snapshot for `scope`.
    pub fn empty(scope: PartitionScope) -> Self {
        Self::new(scope, Vec::new())
    }

    /// Fingerprint of a scope and an already-sorted item list.
    pub fn compute_fingerprint(scope: &PartitionScope, items: &[RankedItem]) -> String {
        let input = FingerprintInput {
            scope,
            ranks: items
                .iter()
                .map(|item| (&item.item_id, scope.rank_of(item)))
                .collect(),
        };
        canonical_hash_hex(&input)
    }

    /// Scope this snapshot was taken from.
    pub fn scope(&self) -> &PartitionScope {
        &self.scope
    }

    /// Items, best first.
    pub fn items(&self) -> &[RankedItem] {
        &self.items
    }

    /// Item at sorted index `index`.
    pub fn get(&self, index: usize) -> Option<&RankedItem> {
        self.items.get(index)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fingerprint of membership and ordering.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether an item with `item_id` is part of the snapshot.
    pub fn contains_item(&self, item_id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.item_id == item_id)
    }
}
