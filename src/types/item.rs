//! Rated entities and their ranked representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::partition::PartitionKey;

/// Opaque identifier of a rated entity (track, album or artist).
///
/// The engine never interprets the value; it only compares identifiers for
/// equality and orders them for deterministic iteration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the album a track belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(String);

impl AlbumId {
    /// Create an album identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-defined rating bucket ("loved", "liked", "okay", ...).
///
/// Opaque to the engine beyond being a partition key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Create a category identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of rated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single track.
    Track,
    /// An album.
    Album,
    /// An artist.
    Artist,
}

impl ItemKind {
    /// All kinds, in declaration order.
    pub const ALL: [ItemKind; 3] = [ItemKind::Track, ItemKind::Album, ItemKind::Artist];

    /// Lowercase wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized item kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized item kind: {0:?}")]
pub struct UnknownItemKind(pub String);

impl FromStr for ItemKind {
    type Err = UnknownItemKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "track" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            _ => Err(UnknownItemKind(s.to_string())),
        }
    }
}

/// One user's ranked entry for one entity inside one category.
///
/// `position` is the dense rank inside the `(category_id, item_kind)`
/// partition (0 = best). `personal_score` decreases as `position` increases
/// but only the ordering is stable across insertions, not the exact values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    /// Rated entity.
    pub item_id: ItemId,
    /// Kind of the rated entity.
    pub item_kind: ItemKind,
    /// Parent album, tracks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<AlbumId>,
    /// Rating bucket the item lives in.
    pub category_id: CategoryId,
    /// Dense rank within the partition, 0 = best.
    pub position: usize,
    /// Order-preserving proxy for `position`.
    pub personal_score: f64,
    /// Secondary ordering among tracks sharing `album_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_within_album: Option<usize>,
}

impl RankedItem {
    /// Create a ranked item without album information.
    pub fn new(
        item_id: ItemId,
        item_kind: ItemKind,
        category_id: CategoryId,
        position: usize,
        personal_score: f64,
    ) -> Self {
        Self {
            item_id,
            item_kind,
            album_id: None,
            category_id,
            position,
            personal_score,
            rank_within_album: None,
        }
    }

    /// Attach the parent album of a track.
    pub fn with_album(mut self, album_id: AlbumId) -> Self {
        self.album_id = Some(album_id);
        self
    }

    /// Attach the within-album rank of a track.
    pub fn with_rank_within_album(mut self, rank: usize) -> Self {
        self.rank_within_album = Some(rank);
        self
    }

    /// Partition this item belongs to.
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.category_id.clone(), self.item_kind)
    }
}
