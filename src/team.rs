//! Team aggregation
//!
//! Groups individual results by normalized team key and counts primary types.
//! Aggregation is a monoid fold: starting from [`TeamDistribution::empty`],
//! pushing results one at a time (in any order) or merging partial aggregates
//! gives the same distribution as aggregating the whole history at once.

use crate::error::EngineError;
use crate::types::{Center, EnneagramType, IndividualResult, TYPE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Normalize a team name for grouping: trimmed and lowercased.
///
/// Returns `None` for blank names, which belong to no team.
pub fn normalize_team_key(team: &str) -> Option<String> {
    let trimmed = team.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Primary-type counts over the nine types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCounts([u32; TYPE_COUNT]);

impl TypeCounts {
    pub fn count(&self, t: EnneagramType) -> u32 {
        self.0[t.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn increment(&mut self, t: EnneagramType) {
        self.0[t.index()] += 1;
    }

    pub fn merge(&mut self, other: &TypeCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }

    /// Share of the total, as a percentage rounded to one decimal place
    pub fn percentage(&self, t: EnneagramType) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        round_one_decimal(f64::from(self.count(t)) * 100.0 / f64::from(total))
    }

    /// Exact fraction of the total (unrounded)
    pub fn proportion(&self, t: EnneagramType) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.count(t)) / f64::from(total)
        }
    }

    /// Count and percentage for every type with at least one member
    pub fn shares(&self) -> Vec<TypeShare> {
        EnneagramType::ALL
            .iter()
            .filter(|&&t| self.count(t) > 0)
            .map(|&t| TypeShare {
                primary_type: t,
                count: self.count(t),
                percentage: self.percentage(t),
            })
            .collect()
    }

    pub fn center_count(&self, center: Center) -> u32 {
        center.members().iter().map(|&t| self.count(t)).sum()
    }
}

/// One row of a distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub primary_type: EnneagramType,
    pub count: u32,
    pub percentage: f64,
}

/// Primary-type distribution for one normalized team key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDistribution {
    team: String,
    counts: TypeCounts,
}

impl TeamDistribution {
    /// Identity element of the fold for a (normalized) team key
    pub fn empty(team_key: &str) -> Self {
        Self {
            team: normalize_team_key(team_key).unwrap_or_default(),
            counts: TypeCounts::default(),
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn counts(&self) -> &TypeCounts {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.total()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, t: EnneagramType) -> u32 {
        self.counts.count(t)
    }

    pub fn percentage(&self, t: EnneagramType) -> f64 {
        self.counts.percentage(t)
    }

    pub fn shares(&self) -> Vec<TypeShare> {
        self.counts.shares()
    }

    /// Whether a result belongs to this distribution's team
    pub fn accepts(&self, result: &IndividualResult) -> bool {
        !self.team.is_empty()
            && result
                .team
                .as_deref()
                .and_then(normalize_team_key)
                .is_some_and(|key| key == self.team)
    }

    /// Fold one more result in; results from other teams are ignored.
    ///
    /// Returns whether the result was counted.
    pub fn push(&mut self, result: &IndividualResult) -> bool {
        if self.accepts(result) {
            self.counts.increment(result.primary_type);
            true
        } else {
            false
        }
    }

    /// Combine two partial aggregates of the same team.
    ///
    /// The caller is responsible for both sides sharing a team key; the
    /// receiver keeps its own key.
    pub fn merge(&mut self, other: &TeamDistribution) {
        self.counts.merge(&other.counts);
    }
}

/// Aggregator for team distributions
pub struct TeamAggregator;

impl TeamAggregator {
    /// Count primary types among results whose team matches `team_key`.
    ///
    /// Fails with [`EngineError::EmptyTeam`] when no result matches.
    pub fn aggregate(
        results: &[IndividualResult],
        team_key: &str,
    ) -> Result<TeamDistribution, EngineError> {
        let mut distribution = TeamDistribution::empty(team_key);
        for result in results {
            distribution.push(result);
        }

        if distribution.is_empty() {
            return Err(EngineError::EmptyTeam(team_key.trim().to_string()));
        }

        debug!(
            team = distribution.team(),
            members = distribution.total(),
            "Team aggregated"
        );
        Ok(distribution)
    }
}

/// Convenience wrapper for [`TeamAggregator::aggregate`]
pub fn aggregate(
    results: &[IndividualResult],
    team_key: &str,
) -> Result<TeamDistribution, EngineError> {
    TeamAggregator::aggregate(results, team_key)
}

/// Primary-type counts across every result regardless of team
pub fn overall_distribution(results: &[IndividualResult]) -> TypeCounts {
    let mut counts = TypeCounts::default();
    for result in results {
        counts.increment(result.primary_type);
    }
    counts
}

/// Distinct normalized team keys present in the results, sorted
pub fn team_keys(results: &[IndividualResult]) -> BTreeSet<String> {
    results
        .iter()
        .filter_map(|r| r.team.as_deref().and_then(normalize_team_key))
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
