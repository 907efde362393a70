//! Binary insertion by human comparison.
//!
//! An [`InsertionSession`] places one new item into a frozen partition
//! snapshot by asking the caller to compare it against existing items.
//!
//! ## Algorithm
//!
//! 1. Empty snapshot: complete immediately at position 0, no questions.
//! 2. Otherwise the search window is `[low, end)` over the snapshot indices,
//!    starting at `[0, len)`. The candidate is `mid = (low + end - 1) / 2`,
//!    the higher-ranked of two middles.
//! 3. New item wins: `end = mid`. Existing item wins or skip: `low = mid + 1`.
//! 4. When the window is empty the new item's position is `low`.
//!
//! The window shrinks every step, so a partition of `n` items needs at most
//! `ceil(log2(n + 1))` answers ([`max_comparisons`]).
//!
//! Answers are assumed transitive. Contradictory answers are not detected;
//! the resulting position simply reflects the answers given.

use serde::{Deserialize, Serialize};

use crate::types::{
    ComparisonOutcome, ComparisonResult, ItemId, PartitionSnapshot, RankedItem, SessionId,
};
use super::partition::{validate_ranks, PartitionError};

/// Upper bound on answers needed for a partition of `len` items: `ceil(log2(len + 1))`.
pub fn max_comparisons(len: usize) -> usize {
    (usize::BITS - len.leading_zeros()) as usize
}

/// Error type for insertion sessions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The snapshot violates partition invariants.
    #[error("Malformed partition snapshot: {0}")]
    MalformedSnapshot(#[from] PartitionError),
    /// The item being rated is already ranked in this partition.
    #[error("Item {0} is already ranked in this partition")]
    AlreadyRanked(ItemId),
    /// The session has finished; no further answers are accepted.
    #[error("Insertion session {0} is already complete")]
    AlreadyComplete(SessionId),
    /// The reported winner is neither the new item nor the current candidate.
    #[error("Winner {winner} is neither new item {new_item} nor candidate {candidate}")]
    InvalidWinner {
        /// Reported winner.
        winner: ItemId,
        /// Item being rated.
        new_item: ItemId,
        /// Item currently compared against.
        candidate: ItemId,
    },
}

/// State of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the answer to a comparison against `snapshot[mid]`.
    AwaitingComparison {
        /// Inclusive lower bound of the window.
        low: usize,
        /// Exclusive upper bound of the window.
        end: usize,
        /// Index of the current candidate.
        mid: usize,
    },
    /// Search converged.
    Complete {
        /// Rank the new item takes.
        final_position: usize,
    },
}

/// Question the caller has to answer next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareRequest {
    /// Session asking.
    pub session_id: SessionId,
    /// Item being rated.
    pub new_item_id: ItemId,
    /// Existing item to compare against.
    pub candidate: RankedItem,
    /// 1-based number of this question.
    pub comparison_number: usize,
    /// Upper bound on questions for this session.
    pub max_comparisons: usize,
}

/// Result of starting or advancing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SessionStep {
    /// Another comparison is needed.
    Compare(CompareRequest),
    /// The session converged.
    Complete {
        /// Rank the new item takes.
        final_position: usize,
    },
}

/// One in-flight "rate this item" action.
///
/// Owned by exactly one rating flow. Dropping it cancels the action; nothing
/// is persisted until the caller commits a completed session.
#[derive(Debug, Clone)]
pub struct InsertionSession {
    id: SessionId,
    new_item_id: ItemId,
    snapshot: PartitionSnapshot,
    state: SessionState,
    history: Vec<ComparisonResult>,
}

impl InsertionSession {
    /// Start placing `new_item_id` into `snapshot`.
    ///
    /// Fails fast on malformed snapshots (duplicate or missing ranks,
    /// duplicate or foreign items) and when the new item is already part of
    /// the snapshot.
    pub fn begin(new_item_id: ItemId, snapshot: PartitionSnapshot) -> Result<Self, SessionError> {
        validate_ranks(snapshot.scope(), snapshot.items())?;
        if snapshot.contains_item(&new_item_id) {
            return Err(SessionError::AlreadyRanked(new_item_id));
        }

        let state = if snapshot.is_empty() {
            SessionState::Complete { final_position: 0 }
        } else {
            window(0, snapshot.len())
        };

        let session = Self {
            id: SessionId::new(),
            new_item_id,
            snapshot,
            state,
            history: Vec::new(),
        };

        tracing::debug!(
            session_id = %session.id,
            item_id = %session.new_item_id,
            scope = %session.snapshot.scope(),
            partition_len = session.snapshot.len(),
            max_comparisons = max_comparisons(session.snapshot.len()),
            "Insertion session started"
        );

        Ok(session)
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Item being rated.
    pub fn new_item_id(&self) -> &ItemId {
        &self.new_item_id
    }

    /// Frozen snapshot the session runs against.
    pub fn snapshot(&self) -> &PartitionSnapshot {
        &self.snapshot
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Answers collected so far, in order.
    pub fn history(&self) -> &[ComparisonResult] {
        &self.history
    }

    /// Final position once complete.
    pub fn final_position(&self) -> Option<usize> {
        match self.state {
            SessionState::Complete { final_position } => Some(final_position),
            SessionState::AwaitingComparison { .. } => None,
        }
    }

    /// Whether the session has converged.
    pub fn is_complete(&self) -> bool {
        self.final_position().is_some()
    }

    /// Existing item the new item is currently compared against.
    pub fn current_candidate(&self) -> Option<&RankedItem> {
        match self.state {
            SessionState::AwaitingComparison { mid, .. } => self.snapshot.get(mid),
            SessionState::Complete { .. } => None,
        }
    }

    /// What the caller has to do next.
    pub fn step(&self) -> SessionStep {
        match self.state {
            SessionState::Complete { final_position } => SessionStep::Complete { final_position },
            SessionState::AwaitingComparison { mid, .. } => SessionStep::Compare(CompareRequest {
                session_id: self.id,
                new_item_id: self.new_item_id.clone(),
                candidate: self.snapshot.items()[mid].clone(),
                comparison_number: self.history.len() + 1,
                max_comparisons: max_comparisons(self.snapshot.len()),
            }),
        }
    }

    /// Apply the answer to the current comparison.
    pub fn answer(&mut self, outcome: ComparisonOutcome) -> Result<SessionStep, SessionError> {
        let (low, end, mid) = match self.state {
            SessionState::AwaitingComparison { low, end, mid } => (low, end, mid),
            SessionState::Complete { .. } => return Err(SessionError::AlreadyComplete(self.id)),
        };

        let candidate_id = self.snapshot.items()[mid].item_id.clone();
        self.history.push(ComparisonResult::new(
            candidate_id.clone(),
            self.new_item_id.clone(),
            outcome,
        ));

        let (low, end) = if outcome.ranks_new_item_higher() {
            (low, mid)
        } else {
            (mid + 1, end)
        };

        self.state = if low >= end {
            SessionState::Complete { final_position: low }
        } else {
            window(low, end)
        };

        tracing::debug!(
            session_id = %self.id,
            candidate = %candidate_id,
            outcome = %outcome,
            comparisons = self.history.len(),
            state = ?self.state,
            "Comparison answered"
        );

        Ok(self.step())
    }

    /// Apply an answer given as the winner's id.
    ///
    /// An id that is neither the new item nor the current candidate is
    /// rejected and leaves the session unchanged.
    pub fn answer_winner(&mut self, winner: &ItemId) -> Result<SessionStep, SessionError> {
        let candidate = match self.current_candidate() {
            Some(candidate) => candidate.item_id.clone(),
            None => return Err(SessionError::AlreadyComplete(self.id)),
        };

        let outcome = if winner == &self.new_item_id {
            ComparisonOutcome::NewItemWins
        } else if winner == &candidate {
            ComparisonOutcome::ExistingItemWins
        } else {
            return Err(SessionError::InvalidWinner {
                winner: winner.clone(),
                new_item: self.new_item_id.clone(),
                candidate,
            });
        };

        self.answer(outcome)
    }

    /// Skip the current comparison (ranks the new item down, never up).
    pub fn skip(&mut self) -> Result<SessionStep, SessionError> {
        self.answer(ComparisonOutcome::Skip)
    }
}

fn window(low: usize, end: usize) -> SessionState {
    SessionState::AwaitingComparison {
        low,
        end,
        mid: low + (end - 1 - low) / 2,
    }
}
