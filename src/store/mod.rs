//! Persistence boundary for ranked items.
//!
//! The ranking engines never talk to storage directly. A host supplies a
//! [`RankingStore`] (usually a client for the remote backend); the
//! coordinator loads snapshots from it and hands it finished writes.

pub mod memory;

use async_trait::async_trait;
use crate::types::{ComparisonResult, ItemId, ItemKind, PartitionScope, PartitionSnapshot, RankedItem, RankingWrite};

/// Trait for ranking storage backends.
///
/// Implementations must return snapshots sorted best first and must apply
/// each [`RankingWrite`] atomically: shift ranks, store the item, and
/// persist the comparison history, or change nothing at all.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Snapshot of the partition or album ordering behind `scope`.
    async fn load_partition(&self, scope: &PartitionScope) -> Result<PartitionSnapshot, Self::Error>;

    /// Ranked entry of `item_id`, in whichever category it currently lives.
    async fn find_item(&self, item_id: &ItemId, kind: ItemKind) -> Result<Option<RankedItem>, Self::Error>;

    /// Apply a committed write.
    ///
    /// Must reject the write if the stored ordering no longer matches
    /// `write.base_fingerprint`.
    async fn apply(&self, write: &RankingWrite) -> Result<(), Self::Error>;

    /// Remove an item from its category, compacting positions behind it.
    async fn remove(&self, item_id: &ItemId, kind: ItemKind) -> Result<RankedItem, Self::Error>;

    /// Stored comparison records involving `item_id`, oldest first.
    async fn comparisons_for(&self, item_id: &ItemId) -> Result<Vec<ComparisonResult>, Self::Error>;
}

pub use memory::{InMemoryRankingStore, InMemoryError};
