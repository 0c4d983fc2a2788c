//! Core types for the assessment engine
//!
//! This module defines the data structures shared by every stage: personality
//! types and centers, question items, responses, score vectors and the
//! individual result produced for one completed assessment.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of personality types on the cycle
pub const TYPE_COUNT: usize = 9;

/// Lowest and highest accepted Likert answer
pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;

/// One of the nine personality types (ids 1-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EnneagramType(u8);

impl EnneagramType {
    /// All types in ascending id order
    pub const ALL: [EnneagramType; TYPE_COUNT] = [
        EnneagramType(1),
        EnneagramType(2),
        EnneagramType(3),
        EnneagramType(4),
        EnneagramType(5),
        EnneagramType(6),
        EnneagramType(7),
        EnneagramType(8),
        EnneagramType(9),
    ];

    pub fn new(id: u8) -> Result<Self, EngineError> {
        if (1..=TYPE_COUNT as u8).contains(&id) {
            Ok(Self(id))
        } else {
            Err(EngineError::InvalidType(id))
        }
    }

    pub fn id(self) -> u8 {
        self.0
    }

    /// Zero-based slot used by fixed-size per-type tables
    pub(crate) fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// The two neighbours on the nine-point cycle, lower id first.
    ///
    /// Type 1 wraps to 9 and type 9 wraps to 1.
    pub fn wing_candidates(self) -> [EnneagramType; 2] {
        let below = if self.0 == 1 { 9 } else { self.0 - 1 };
        let above = if self.0 == 9 { 1 } else { self.0 + 1 };
        let (low, high) = if below < above {
            (below, above)
        } else {
            (above, below)
        };
        [EnneagramType(low), EnneagramType(high)]
    }

    pub fn center(self) -> Center {
        match self.0 {
            2..=4 => Center::Heart,
            5..=7 => Center::Head,
            _ => Center::Gut,
        }
    }
}

impl TryFrom<u8> for EnneagramType {
    type Error = EngineError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<EnneagramType> for u8 {
    fn from(t: EnneagramType) -> Self {
        t.0
    }
}

impl fmt::Display for EnneagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Intelligence center grouping three adjacent types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Center {
    Gut,
    Heart,
    Head,
}

impl Center {
    pub const ALL: [Center; 3] = [Center::Gut, Center::Heart, Center::Head];

    pub fn members(self) -> [EnneagramType; 3] {
        let ids = match self {
            Center::Gut => [8, 9, 1],
            Center::Heart => [2, 3, 4],
            Center::Head => [5, 6, 7],
        };
        ids.map(EnneagramType)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Center::Gut => "gut",
            Center::Heart => "heart",
            Center::Head => "head",
        }
    }
}

/// A scored question item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Globally unique item id
    pub id: u32,
    /// Question text shown to the participant
    pub text: String,
    /// Type this item measures
    #[serde(rename = "type")]
    pub item_type: EnneagramType,
    /// Agreement indicates a lower association with the type
    #[serde(default)]
    pub reverse: bool,
}

impl Item {
    /// Orient a raw answer so higher always means stronger agreement with the type
    pub fn normalized_value(&self, value: u8) -> u32 {
        let value = u32::from(value);
        if self.reverse {
            u32::from(MIN_ANSWER + MAX_ANSWER) - value
        } else {
            value
        }
    }
}

/// One answered item, keyed by item id rather than presentation position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    pub item_id: u32,
    pub value: u8,
}

impl Response {
    pub fn new(item_id: u32, value: u8) -> Self {
        Self { item_id, value }
    }
}

/// Accumulated score per type; every type always has a slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreVector([u32; TYPE_COUNT]);

impl ScoreVector {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn from_scores(scores: [u32; TYPE_COUNT]) -> Self {
        Self(scores)
    }

    pub fn get(&self, t: EnneagramType) -> u32 {
        self.0[t.index()]
    }

    pub(crate) fn add(&mut self, t: EnneagramType, amount: u32) {
        self.0[t.index()] += amount;
    }

    /// Scores paired with their type, ascending by type id
    pub fn iter(&self) -> impl Iterator<Item = (EnneagramType, u32)> + '_ {
        EnneagramType::ALL.iter().map(move |&t| (t, self.get(t)))
    }

    pub fn max_score(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Sum of the three type scores belonging to a center
    pub fn center_score(&self, center: Center) -> u32 {
        center.members().iter().map(|&t| self.get(t)).sum()
    }

    pub fn as_array(&self) -> &[u32; TYPE_COUNT] {
        &self.0
    }
}

/// Response-style statistics over the raw answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidityStats {
    pub mean: f64,
    /// Population standard deviation
    pub sd: f64,
}

impl ValidityStats {
    /// Mean pinned near either end of the scale
    pub fn has_extreme_mean(&self) -> bool {
        self.mean > 4.6 || self.mean < 1.4
    }

    /// Answers barely vary, e.g. the same value everywhere
    pub fn has_low_variance(&self) -> bool {
        self.sd < 0.5
    }
}

/// The outcome of one completed assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualResult {
    /// Unique result id, also usable as a deletion token
    pub id: Uuid,
    pub display_name: String,
    pub team: Option<String>,
    pub scores: ScoreVector,
    pub primary_type: EnneagramType,
    pub wing: EnneagramType,
    pub wing_score: u32,
    /// Every type sharing the top score, when more than one does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tied_types: Option<Vec<EnneagramType>>,
    pub validity: ValidityStats,
    pub recorded_at: DateTime<Utc>,
}
