//! Primary type and wing resolution
//!
//! The primary type is the highest-scoring type; the wing is whichever of its
//! two cycle neighbours scores higher. Resolution is total: every score vector
//! yields exactly one pair.

use crate::types::{EnneagramType, ScoreVector};
use serde::{Deserialize, Serialize};

/// Rule for choosing the primary type when several share the top score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest numeric type id wins
    #[default]
    LowestId,
    /// Type whose center has the strictly highest combined score wins;
    /// equal centers fall back to the lower id
    Center,
}

/// Full outcome of resolving a score vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WingResolution {
    pub primary_type: EnneagramType,
    pub wing: EnneagramType,
    pub wing_score: u32,
    /// All types sharing the top score (length 1 when there is no tie)
    pub tied_types: Vec<EnneagramType>,
}

/// Resolver for primary type and wing
pub struct WingResolver;

impl WingResolver {
    /// Resolve `(primary_type, wing)` with lowest-id tie-breaks
    pub fn resolve(scores: &ScoreVector) -> (EnneagramType, EnneagramType) {
        let resolution = Self::resolve_with(scores, TieBreak::LowestId);
        (resolution.primary_type, resolution.wing)
    }

    /// Resolve with an explicit primary-type tie-break policy
    pub fn resolve_with(scores: &ScoreVector, tie_break: TieBreak) -> WingResolution {
        let tied = tied_types(scores);
        let primary_type = match tie_break {
            TieBreak::LowestId => tied[0],
            TieBreak::Center => primary_by_center(scores, &tied),
        };
        let (wing, wing_score) = strongest_neighbour(scores, primary_type);

        WingResolution {
            primary_type,
            wing,
            wing_score,
            tied_types: tied,
        }
    }
}

/// Convenience wrapper for [`WingResolver::resolve`]
pub fn resolve_wing(scores: &ScoreVector) -> (EnneagramType, EnneagramType) {
    WingResolver::resolve(scores)
}

/// Types sharing the maximum score, ascending. Never empty.
pub fn tied_types(scores: &ScoreVector) -> Vec<EnneagramType> {
    let max = scores.max_score();
    scores
        .iter()
        .filter(|&(_, score)| score == max)
        .map(|(t, _)| t)
        .collect()
}

fn primary_by_center(scores: &ScoreVector, tied: &[EnneagramType]) -> EnneagramType {
    let mut best = tied[0];
    let mut best_center_score = scores.center_score(best.center());
    for &t in &tied[1..] {
        let center_score = scores.center_score(t.center());
        if center_score > best_center_score {
            best = t;
            best_center_score = center_score;
        }
    }
    best
}

fn strongest_neighbour(scores: &ScoreVector, primary: EnneagramType) -> (EnneagramType, u32) {
    // candidates come lower id first, so the strict comparison keeps it on ties
    let [low, high] = primary.wing_candidates();
    if scores.get(high) > scores.get(low) {
        (high, scores.get(high))
    } else {
        (low, scores.get(low))
    }
}
