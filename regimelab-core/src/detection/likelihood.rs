//! Regime likelihood aggregator.

use super::scorer::RawRegimeScores;
use crate::domain::RegimeProbabilities;

/// Normalize raw regime scores onto the probability simplex.
///
/// A zero total divides by 1 instead, leaving the (zero) scores unchanged.
pub fn likelihood(raw: &RawRegimeScores) -> RegimeProbabilities {
    raw.normalized()
}
