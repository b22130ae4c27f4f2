//! Mapping between continuous wolf positions and decision-tree hyperparameters

use crate::error::{GreyWolfError, Result};
use crate::training::Criterion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of tuned hyperparameters: criterion, max_depth, min_samples_split, min_samples_leaf
pub const DIM: usize = 4;

/// A candidate vector in the continuous search space
pub type Position = [f64; DIM];

/// Valid decoded range of `max_depth`
pub const MAX_DEPTH_RANGE: (i64, i64) = (2, 10);
/// Valid decoded range of `min_samples_split`
pub const MIN_SAMPLES_SPLIT_RANGE: (i64, i64) = (2, 10);
/// Valid decoded range of `min_samples_leaf`
pub const MIN_SAMPLES_LEAF_RANGE: (i64, i64) = (1, 10);

/// Inclusive range of one search dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lo: f64,
    pub hi: f64,
}

impl Bound {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Clamp `value` into the range. NaN maps to `lo`.
    pub fn clip(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.lo;
        }
        value.max(self.lo).min(self.hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

/// Per-dimension bounds used for initialization and post-update clipping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds(pub [Bound; DIM]);

impl Default for SearchBounds {
    fn default() -> Self {
        Self([
            Bound::new(0.0, 1.0),
            Bound::new(2.0, 10.0),
            Bound::new(2.0, 10.0),
            Bound::new(1.0, 10.0),
        ])
    }
}

impl SearchBounds {
    pub fn dims(&self) -> &[Bound; DIM] {
        &self.0
    }

    /// Clip every component of `position` into its dimension's range
    pub fn clip(&self, position: &Position) -> Position {
        let mut clipped = *position;
        for (value, bound) in clipped.iter_mut().zip(self.0.iter()) {
            *value = bound.clip(*value);
        }
        clipped
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.iter().zip(self.0.iter()).all(|(v, b)| b.contains(*v))
    }

    /// Reject non-finite or inverted ranges
    pub fn validate(&self) -> Result<()> {
        for (i, bound) in self.0.iter().enumerate() {
            if !bound.lo.is_finite() || !bound.hi.is_finite() || bound.lo > bound.hi {
                return Err(GreyWolfError::InvalidParameter {
                    name: format!("bounds[{}]", i),
                    value: format!("[{}, {}]", bound.lo, bound.hi),
                    reason: "expected finite lo <= hi".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Decoded decision-tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl fmt::Display for TreeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "criterion={}, max_depth={}, min_samples_split={}, min_samples_leaf={}",
            self.criterion, self.max_depth, self.min_samples_split, self.min_samples_leaf
        )
    }
}

/// Round half to even, then saturate into `i64` (NaN becomes 0)
fn round_to_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn round_and_clip(value: f64, (lo, hi): (i64, i64)) -> usize {
    round_to_int(value).clamp(lo, hi) as usize
}

/// Decode a position into tree hyperparameters.
///
/// Total for any real input: each integer field is rounded then clipped into
/// its valid range, and the criterion is gini only when element 0 rounds to 0.
pub fn decode(position: &Position) -> TreeParams {
    let criterion = if round_to_int(position[0]) == 0 && !position[0].is_nan() {
        Criterion::Gini
    } else {
        Criterion::Entropy
    };

    TreeParams {
        criterion,
        max_depth: round_and_clip(position[1], MAX_DEPTH_RANGE),
        min_samples_split: round_and_clip(position[2], MIN_SAMPLES_SPLIT_RANGE),
        min_samples_leaf: round_and_clip(position[3], MIN_SAMPLES_LEAF_RANGE),
    }
}

/// Canonical position for a configuration; `decode(&encode(p)) == p` for valid `p`
pub fn encode(params: &TreeParams) -> Position {
    let criterion = match params.criterion {
        Criterion::Gini => 0.0,
        Criterion::Entropy => 1.0,
    };
    [
        criterion,
        params.max_depth as f64,
        params.min_samples_split as f64,
        params.min_samples_leaf as f64,
    ]
}
