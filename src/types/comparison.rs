//! Head-to-head comparison answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::ItemId;

/// Answer to one "which is better?" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// The item being rated beats the candidate.
    NewItemWins,
    /// The already-ranked candidate beats the item being rated.
    ExistingItemWins,
    /// The user declined to answer; treated as "new item is no better".
    Skip,
}

impl ComparisonOutcome {
    /// Whether the new item moves above the candidate.
    pub fn ranks_new_item_higher(&self) -> bool {
        matches!(self, Self::NewItemWins)
    }
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewItemWins => write!(f, "new_item_wins"),
            Self::ExistingItemWins => write!(f, "existing_item_wins"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Record of one answered comparison.
///
/// `winner_id` is `None` when the comparison was skipped. Records live only
/// for the session; the persistence collaborator stores them as an audit
/// trail once the session commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Already-ranked item the new item was compared against.
    pub candidate_item_id: ItemId,
    /// Item being rated.
    pub new_item_id: ItemId,
    /// Winner, or `None` for a skip.
    pub winner_id: Option<ItemId>,
    /// Raw answer.
    pub outcome: ComparisonOutcome,
    /// When the answer was recorded.
    pub compared_at: DateTime<Utc>,
}

impl ComparisonResult {
    /// Record an answer for `new_item_id` vs `candidate_item_id`.
    pub fn new(candidate_item_id: ItemId, new_item_id: ItemId, outcome: ComparisonOutcome) -> Self {
        let winner_id = match outcome {
            ComparisonOutcome::NewItemWins => Some(new_item_id.clone()),
            ComparisonOutcome::ExistingItemWins => Some(candidate_item_id.clone()),
            ComparisonOutcome::Skip => None,
        };
        Self {
            candidate_item_id,
            new_item_id,
            winner_id,
            outcome,
            compared_at: Utc::now(),
        }
    }

    /// Whether this comparison was skipped.
    pub fn is_skip(&self) -> bool {
        self.winner_id.is_none()
    }
}
