//! Outbound write requests produced when an insertion session commits.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::comparison::ComparisonResult;
use super::item::{AlbumId, CategoryId, ItemId, ItemKind, RankedItem};
use super::partition::PartitionScope;

/// Identifier of one insertion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write request handed to the persistence collaborator.
///
/// The collaborator must apply it atomically: shift the ranks of every item
/// at or after `position` in `scope` by one, store the new item at
/// `position`, and persist `comparison_history` as the audit trail. A write
/// whose `base_fingerprint` no longer matches the stored partition was
/// computed from a stale snapshot and must be rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingWrite {
    /// Session that produced the write.
    pub session_id: SessionId,
    /// Item being placed.
    pub item_id: ItemId,
    /// Kind of the item.
    pub item_kind: ItemKind,
    /// Parent album, tracks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<AlbumId>,
    /// Ordering the item is placed into.
    pub scope: PartitionScope,
    /// Final rank within `scope`.
    pub position: usize,
    /// Derived score; `None` for album scope, which carries no scores.
    pub personal_score: Option<f64>,
    /// Every answer collected during the session, in order.
    pub comparison_history: Vec<ComparisonResult>,
    /// Fingerprint of the snapshot the session ran against.
    pub base_fingerprint: String,
    /// Category the item leaves, when the write moves it between categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_category: Option<CategoryId>,
}

impl RankingWrite {
    /// Ranked item to store for a category-scope write.
    ///
    /// Returns `None` for album-scope writes, which only update
    /// `rank_within_album` of an existing item, and for category writes
    /// missing a score.
    pub fn to_ranked_item(&self) -> Option<RankedItem> {
        match (&self.scope, self.personal_score) {
            (PartitionScope::Category(key), Some(personal_score)) => Some(RankedItem {
                item_id: self.item_id.clone(),
                item_kind: self.item_kind,
                album_id: self.album_id.clone(),
                category_id: key.category_id.clone(),
                position: self.position,
                personal_score,
                rank_within_album: None,
            }),
            _ => None,
        }
    }

    /// Number of comparisons the user answered, skips included.
    pub fn comparisons_asked(&self) -> usize {
        self.comparison_history.len()
    }
}
