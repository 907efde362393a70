//! Personal score derivation for newly placed items.
//!
//! ## Policy
//!
//! A new item's score must sit strictly between the scores of its
//! neighbours in the resulting order:
//!
//! ```text
//! top:     first.score + extreme_step
//! middle:  (above.score + below.score) / 2
//! bottom:  last.score - extreme_step
//! empty:   initial_score
//! ```
//!
//! Neighbour scores are never rewritten. Repeated midpoint insertions
//! between the same two neighbours halve the gap every time; once the gap
//! can no longer be split at f64 resolution the derivation fails with
//! [`ScoreError::ResolutionExhausted`] instead of producing a tie.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::types::RankedItem;

/// Quantization factor for float normalization in `params_hash`.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Score policy version identifier.
pub const SCORE_POLICY_VERSION: &str = "score_policy_v1";

/// Parameters of score derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePolicy {
    /// Policy version identifier.
    pub version: String,
    /// Score of the first item in an empty partition.
    pub initial_score: f64,
    /// Offset from the nearest neighbour when inserting at either end.
    pub extreme_step: f64,
}

#[derive(Serialize)]
struct QuantizedScorePolicy<'a> {
    version: &'a str,
    initial_score: i64,
    extreme_step: i64,
}

fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

impl ScorePolicy {
    /// Create a policy with custom parameters.
    pub fn new(initial_score: f64, extreme_step: f64) -> Self {
        Self {
            version: SCORE_POLICY_VERSION.to_string(),
            initial_score,
            extreme_step,
        }
    }

    /// Check the parameters can produce strictly ordered scores.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if !self.initial_score.is_finite() {
            return Err(ScoreError::InvalidPolicy(format!(
                "initial_score must be finite, got {}",
                self.initial_score
            )));
        }
        if !self.extreme_step.is_finite() || self.extreme_step <= 0.0 {
            return Err(ScoreError::InvalidPolicy(format!(
                "extreme_step must be finite and positive, got {}",
                self.extreme_step
            )));
        }
        Ok(())
    }

    /// Stable hash of the policy parameters (floats quantized to 1e-6).
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&QuantizedScorePolicy {
            version: &self.version,
            initial_score: quantize_float(self.initial_score),
            extreme_step: quantize_float(self.extreme_step),
        })
    }
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self::new(10.0, 1.0)
    }
}

/// Error type for score derivation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// Position past the end of the partition.
    #[error("Position {position} is out of range for a partition of {len} items")]
    PositionOutOfRange {
        /// Requested position.
        position: usize,
        /// Partition size.
        len: usize,
    },
    /// No representable score strictly between the neighbours.
    #[error("No representable score at position {position} between {above:?} and {below:?}")]
    ResolutionExhausted {
        /// Requested position.
        position: usize,
        /// Score of the item above, if any.
        above: Option<f64>,
        /// Score of the item below, if any.
        below: Option<f64>,
    },
    /// Policy parameters cannot order scores.
    #[error("Invalid score policy: {0}")]
    InvalidPolicy(String),
}

/// Score for an item placed at `final_position` of `sorted` (best first).
///
/// `sorted` is the partition as it was before the insertion; the new item
/// goes between `sorted[final_position - 1]` and `sorted[final_position]`.
pub fn derive_score(
    final_position: usize,
    sorted: &[RankedItem],
    policy: &ScorePolicy,
) -> Result<f64, ScoreError> {
    if final_position > sorted.len() {
        return Err(ScoreError::PositionOutOfRange {
            position: final_position,
            len: sorted.len(),
        });
    }

    let above = final_position
        .checked_sub(1)
        .and_then(|i| sorted.get(i))
        .map(|item| item.personal_score);
    let below = sorted.get(final_position).map(|item| item.personal_score);

    let score = match (above, below) {
        (None, None) => policy.initial_score,
        (None, Some(below)) => below + policy.extreme_step,
        (Some(above), None) => above - policy.extreme_step,
        (Some(above), Some(below)) => above + (below - above) / 2.0,
    };

    let strictly_between = above.map_or(true, |a| score < a) && below.map_or(true, |b| score > b);
    if !score.is_finite() || !strictly_between {
        tracing::warn!(
            position = final_position,
            above = ?above,
            below = ?below,
            score,
            "Personal score resolution exhausted"
        );
        return Err(ScoreError::ResolutionExhausted {
            position: final_position,
            above,
            below,
        });
    }

    Ok(score)
}
