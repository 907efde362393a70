//! Core types for the ranking engines.

pub mod item;
pub mod partition;
pub mod comparison;
pub mod write;

pub use item::{ItemId, AlbumId, CategoryId, ItemKind, RankedItem, UnknownItemKind};
pub use partition::{PartitionKey, PartitionScope, PartitionSnapshot};
pub use comparison::{ComparisonOutcome, ComparisonResult};
pub use write::{RankingWrite, SessionId};
