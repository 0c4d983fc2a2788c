//! Team balance scoring
//!
//! Turns a team distribution into a balance report:
//! - Normalized Shannon entropy over the nine types (1.0 = perfectly even)
//! - Dominant type and the types nobody on the team has
//! - Center breakdown and qualitative insights

use crate::team::{TeamDistribution, TypeShare};
use crate::types::{Center, EnneagramType, TYPE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Thresholds controlling which insights are emitted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Balance score at or above which a team counts as well balanced
    pub well_balanced: f64,
    /// Share of members (0-1) at which a single type is called dominant
    pub dominant_share: f64,
    /// Share of members (0-1) at which one center is called over-weighted
    pub center_share: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            well_balanced: 0.85,
            dominant_share: 0.5,
            center_share: 0.6,
        }
    }
}

/// Qualitative observation about a team's composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamInsight {
    Monoculture { primary_type: EnneagramType },
    DominantType { primary_type: EnneagramType, share: f64 },
    MissingCenter { center: Center },
    CenterImbalance { center: Center, share: f64 },
    WellBalanced { balance_score: f64 },
    SmallTeam { members: u32 },
}

impl TeamInsight {
    pub fn message(&self) -> String {
        match self {
            TeamInsight::Monoculture { primary_type } => {
                format!("Every member shares primary type {primary_type}")
            }
            TeamInsight::DominantType {
                primary_type,
                share,
            } => format!(
                "Type {primary_type} accounts for {:.1}% of the team",
                share * 100.0
            ),
            TeamInsight::MissingCenter { center } => {
                format!("No members in the {} center", center.as_str())
            }
            TeamInsight::CenterImbalance { center, share } => format!(
                "The {} center holds {:.1}% of the team",
                center.as_str(),
                share * 100.0
            ),
            TeamInsight::WellBalanced { balance_score } => {
                format!("Types are evenly spread (balance {balance_score:.2})")
            }
            TeamInsight::SmallTeam { members } => format!(
                "Only {members} members; some types are necessarily unrepresented"
            ),
        }
    }
}

/// Member count for one center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterShare {
    pub center: Center,
    pub count: u32,
    pub percentage: f64,
}

/// Composition summary for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub team: String,
    pub total_members: u32,
    pub distribution: TeamDistribution,
    /// Count and percentage per represented type
    pub shares: Vec<TypeShare>,
    /// Normalized entropy in [0, 1]
    pub balance_score: f64,
    pub dominant_type: EnneagramType,
    /// Types with no members
    pub underrepresented_types: BTreeSet<EnneagramType>,
    pub center_distribution: Vec<CenterShare>,
    pub insights: Vec<TeamInsight>,
}

/// Scorer producing balance reports
#[derive(Debug, Clone, Default)]
pub struct BalanceScorer {
    thresholds: InsightThresholds,
}

impl BalanceScorer {
    pub fn new(thresholds: InsightThresholds) -> Self {
        Self { thresholds }
    }

    /// Score a distribution.
    ///
    /// Expects a non-empty distribution; an empty one scores 0 with type 1 as
    /// the nominal dominant type.
    pub fn score(&self, distribution: &TeamDistribution) -> BalanceReport {
        let counts = distribution.counts();
        let total = counts.total();

        let balance_score = normalized_entropy(distribution);
        let dominant_type = dominant_type(distribution);
        let underrepresented_types = EnneagramType::ALL
            .iter()
            .copied()
            .filter(|&t| counts.count(t) == 0)
            .collect();

        let center_distribution = Center::ALL
            .iter()
            .map(|&center| {
                let count = counts.center_count(center);
                CenterShare {
                    center,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect::<Vec<_>>();

        let insights = self.insights(distribution, balance_score, dominant_type);

        debug!(
            team = distribution.team(),
            balance_score,
            dominant = %dominant_type,
            "Team balance scored"
        );

        BalanceReport {
            team: distribution.team().to_string(),
            total_members: total,
            distribution: distribution.clone(),
            shares: distribution.shares(),
            balance_score,
            dominant_type,
            underrepresented_types,
            center_distribution,
            insights,
        }
    }

    fn insights(
        &self,
        distribution: &TeamDistribution,
        balance_score: f64,
        dominant: EnneagramType,
    ) -> Vec<TeamInsight> {
        let counts = distribution.counts();
        let total = counts.total();
        let mut insights = Vec::new();
        if total == 0 {
            return insights;
        }

        let dominant_share = counts.proportion(dominant);
        if total > 1 && counts.count(dominant) == total {
            insights.push(TeamInsight::Monoculture {
                primary_type: dominant,
            });
        } else if total > 1 && dominant_share >= self.thresholds.dominant_share {
            insights.push(TeamInsight::DominantType {
                primary_type: dominant,
                share: dominant_share,
            });
        }

        for center in Center::ALL {
            let count = counts.center_count(center);
            let share = f64::from(count) / f64::from(total);
            if count == 0 {
                insights.push(TeamInsight::MissingCenter { center });
            } else if total > 1 && share >= self.thresholds.center_share {
                insights.push(TeamInsight::CenterImbalance { center, share });
            }
        }

        if balance_score >= self.thresholds.well_balanced {
            insights.push(TeamInsight::WellBalanced { balance_score });
        }

        if (total as usize) < TYPE_COUNT {
            insights.push(TeamInsight::SmallTeam { members: total });
        }

        insights
    }
}

/// Score a distribution with default insight thresholds
pub fn score(distribution: &TeamDistribution) -> BalanceReport {
    BalanceScorer::default().score(distribution)
}

/// Shannon entropy of the type proportions divided by ln(9)
pub fn normalized_entropy(distribution: &TeamDistribution) -> f64 {
    let counts = distribution.counts();
    if counts.is_empty() {
        return 0.0;
    }

    let entropy: f64 = EnneagramType::ALL
        .iter()
        .map(|&t| counts.proportion(t))
        .filter(|&p| p > 0.0)
        .map(|p| p * (1.0 / p).ln())
        .sum();

    (entropy / (TYPE_COUNT as f64).ln()).clamp(0.0, 1.0)
}

/// Type with the highest count; the lowest id wins ties
pub fn dominant_type(distribution: &TeamDistribution) -> EnneagramType {
    let mut best = EnneagramType::ALL[0];
    for &t in &EnneagramType::ALL[1..] {
        if distribution.count(t) > distribution.count(best) {
            best = t;
        }
    }
    best
}

fn percentage(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (f64::from(count) * 1000.0 / f64::from(total)).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::aggregate;
    use crate::team::tests::member;
    use crate::types::IndividualResult;
    use pretty_assertions::assert_eq;

    fn t(id: u8) -> EnneagramType {
        EnneagramType::new(id).unwrap()
    }

    fn team_of(primaries: &[u8]) -> Vec<IndividualResult> {
        primaries
            .iter()
            .enumerate()
            .map(|(i, &p)| member(&format!("member-{i}"), Some("alpha"), p))
            .collect()
    }

    #[test]
    fn test_uniform_team_scores_one() {
        let results = team_of(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let report = score(&aggregate(&results, "alpha").unwrap());

        assert!((report.balance_score - 1.0).abs() < 1e-9);
        assert!(report.underrepresented_types.is_empty());
        assert_eq!(report.dominant_type, t(1));
        assert!(report
            .insights
            .iter()
            .any(|i| matches!(i, TeamInsight::WellBalanced { .. })));
    }

    #[test]
    fn test_monoculture_scores_zero() {
        let results = team_of(&[6, 6, 6, 6]);
        let report = score(&aggregate(&results, "alpha").unwrap());

        assert_eq!(report.balance_score, 0.0);
        assert_eq!(report.dominant_type, t(6));
        assert_eq!(report.underrepresented_types.len(), 8);
        assert!(report.insights.contains(&TeamInsight::Monoculture {
            primary_type: t(6)
        }));
    }

    #[test]
    fn test_balance_grows_with_diversity() {
        let narrow = score(&aggregate(&team_of(&[2, 2, 2, 2, 2, 2, 2, 5]), "alpha").unwrap());
        let wider = score(&aggregate(&team_of(&[2, 2, 3, 3, 5, 5, 8, 8]), "alpha").unwrap());

        assert!(narrow.balance_score > 0.0);
        assert!(narrow.balance_score < wider.balance_score);
        assert!(wider.balance_score < 1.0);
    }

    #[test]
    fn test_alpha_report() {
        let report = score(&aggregate(&team_of(&[4, 4, 7]), "alpha").unwrap());

        assert_eq!(report.team, "alpha");
        assert_eq!(report.total_members, 3);
        assert_eq!(report.dominant_type, t(4));

        let expected: BTreeSet<EnneagramType> = [1, 2, 3, 5, 6, 8, 9].into_iter().map(t).collect();
        assert_eq!(report.underrepresented_types, expected);

        assert_eq!(report.shares.len(), 2);
        assert_eq!(report.shares[0].percentage, 66.7);
        assert_eq!(report.shares[1].percentage, 33.3);
    }

    #[test]
    fn test_dominant_tie_picks_lowest_id() {
        let report = score(&aggregate(&team_of(&[8, 3, 8, 3]), "alpha").unwrap());
        assert_eq!(report.dominant_type, t(3));
    }

    #[test]
    fn test_center_insights() {
        // all members in the head center
        let report = score(&aggregate(&team_of(&[5, 6, 7, 5]), "alpha").unwrap());

        assert!(report.insights.contains(&TeamInsight::MissingCenter {
            center: Center::Gut
        }));
        assert!(report.insights.contains(&TeamInsight::MissingCenter {
            center: Center::Heart
        }));
        assert!(report.insights.contains(&TeamInsight::CenterImbalance {
            center: Center::Head,
            share: 1.0
        }));
        assert!(report
            .insights
            .contains(&TeamInsight::SmallTeam { members: 4 }));

        let head = report
            .center_distribution
            .iter()
            .find(|c| c.center == Center::Head)
            .unwrap();
        assert_eq!(head.count, 4);
        assert_eq!(head.percentage, 100.0);
    }

    #[test]
    fn test_insight_messages() {
        let insight = TeamInsight::DominantType {
            primary_type: t(3),
            share: 0.5,
        };
        assert_eq!(insight.message(), "Type 3 accounts for 50.0% of the team");
    }

    #[test]
    fn test_report_serializes() {
        let report = score(&aggregate(&team_of(&[4, 4, 7]), "alpha").unwrap());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["dominant_type"], 4);
        assert_eq!(json["shares"][0]["type"], 4);
        assert_eq!(json["insights"][0]["kind"], "dominant_type");
    }
}
