//! # prestige-ranking
//!
//! Personal ranking and listening tiers for music items.
//!
//! The crate answers two questions:
//!
//! > How much has the user listened to this item? (a [`Tier`])
//!
//! > Where does this item belong among everything the user has ranked?
//!
//! ## Core Contract
//!
//! 1. Listening minutes map to exactly one tier, monotonically
//! 2. A new item is placed by binary insertion, asking at most
//!    `ceil(log2(n + 1))` pairwise questions for a partition of `n` items
//! 3. The placed item gets a score strictly between its neighbours;
//!    no existing score is ever rewritten
//!
//! ## Architecture
//!
//! ```text
//! RateRequest → RatingCoordinator → PartitionSnapshot → InsertionSession
//!                      ↓                                      ↓
//!                RankingStore  ◄──── RankingWrite ◄──── derive_score
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same snapshot + same answers → same final position and score
//! - Snapshot fingerprints depend only on scope, membership and ranks
//! - Writes computed against a stale snapshot are rejected by the store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod canonical;
pub mod config;
pub mod tier;
pub mod ranking;
pub mod store;
pub mod coordinator;

// Re-exports
pub use types::{
    ItemId, AlbumId, CategoryId, ItemKind, RankedItem, PartitionKey, PartitionScope,
    PartitionSnapshot, ComparisonOutcome, ComparisonResult, RankingWrite, SessionId,
};
pub use tier::{Tier, ThresholdVariant, TierClassifier, TierProgress, TierTables, TierThresholdTable, TierError};
pub use ranking::{
    Partition, PartitionError, InsertionSession, SessionState, SessionStep, CompareRequest,
    SessionError, max_comparisons, ScorePolicy, ScoreError, derive_score,
};
pub use store::{RankingStore, InMemoryRankingStore, InMemoryError};
pub use config::{RankingConfig, ConfigError};
pub use coordinator::{RatingCoordinator, RatingSession, RateRequest, CoordinatorError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Schema version for all serialized ranking types.
/// Increment on breaking changes to any schema type.
pub const RANKING_SCHEMA_VERSION: &str = "1.0.0";
