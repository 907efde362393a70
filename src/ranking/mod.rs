//! Interactive ranking: partitions, insertion sessions and score derivation.

pub mod partition;
pub mod session;
pub mod score;

pub use partition::{Partition, PartitionError, validate_ranks};
pub use session::{
    InsertionSession, SessionState, SessionStep, CompareRequest, SessionError, max_comparisons,
};
pub use score::{ScorePolicy, ScoreError, derive_score, SCORE_POLICY_VERSION};
