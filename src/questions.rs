//! Question set loading and validation
//!
//! A question set is supplied by the caller (typically a `questions.json`
//! file) and is only ever read by the engine. Items keep their file order so
//! a presentation layer can show them as authored or shuffle them freely;
//! scoring never looks at position.

use crate::error::EngineError;
use crate::types::{EnneagramType, Item, TYPE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered, id-indexed collection of scored items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Item>", into = "Vec<Item>")]
pub struct QuestionSet {
    items: Vec<Item>,
    index: HashMap<u32, usize>,
}

impl QuestionSet {
    /// Build a question set, rejecting empty sets, duplicate ids and blank text
    pub fn new(items: Vec<Item>) -> Result<Self, EngineError> {
        if items.is_empty() {
            return Err(EngineError::InvalidQuestionSet(
                "question set contains no items".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if item.text.trim().is_empty() {
                return Err(EngineError::InvalidQuestionSet(format!(
                    "item {} has empty text",
                    item.id
                )));
            }
            if index.insert(item.id, position).is_some() {
                return Err(EngineError::InvalidQuestionSet(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }

        Ok(Self { items, index })
    }

    /// Parse the `[{"id", "text", "type", "reverse"}]` file format
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let items: Vec<Item> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.items)?)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: u32) -> Option<&Item> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items measuring each type, ascending by type id
    pub fn items_per_type(&self) -> Vec<(EnneagramType, usize)> {
        let mut counts = [0usize; TYPE_COUNT];
        for item in &self.items {
            counts[item.item_type.index()] += 1;
        }
        EnneagramType::ALL
            .iter()
            .map(|&t| (t, counts[t.index()]))
            .collect()
    }

    /// Every type is measured by the same number of items.
    ///
    /// Scores are summed, so per-type totals are only comparable when this holds.
    pub fn is_balanced(&self) -> bool {
        let counts = self.items_per_type();
        let first = counts[0].1;
        first > 0 && counts.iter().all(|&(_, n)| n == first)
    }
}

impl TryFrom<Vec<Item>> for QuestionSet {
    type Error = EngineError;

    fn try_from(items: Vec<Item>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl From<QuestionSet> for Vec<Item> {
    fn from(set: QuestionSet) -> Self {
        set.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_questions_json() -> &'static str {
        r#"[
            {"id": 1, "text": "I hold myself to high standards", "type": 1},
            {"id": 2, "text": "I anticipate what others need", "type": 2},
            {"id": 3, "text": "I rarely think about how I come across", "type": 3, "reverse": true},
            {"id": 4, "text": "I feel things more deeply than most", "type": 4},
            {"id": 5, "text": "I need time alone to recharge", "type": 5},
            {"id": 6, "text": "I plan for what could go wrong", "type": 6},
            {"id": 7, "text": "I keep my options open", "type": 7},
            {"id": 8, "text": "I take charge in a crisis", "type": 8},
            {"id": 9, "text": "I avoid conflict when I can", "type": 9}
        ]"#
    }

    #[test]
    fn test_from_json() {
        let set = QuestionSet::from_json(sample_questions_json()).unwrap();

        assert_eq!(set.len(), 9);
        assert!(set.get(3).unwrap().reverse);
        assert!(!set.get(4).unwrap().reverse);
        assert!(set.get(42).is_none());
        assert!(set.is_balanced());
    }

    #[test]
    fn test_preserves_file_order() {
        let set = QuestionSet::from_json(sample_questions_json()).unwrap();
        let ids: Vec<u32> = set.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = r#"[
            {"id": 1, "text": "a", "type": 1},
            {"id": 1, "text": "b", "type": 2}
        ]"#;
        let err = QuestionSet::from_json(json).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuestionSet(_)));
    }

    #[test]
    fn test_rejects_out_of_range_type() {
        let json = r#"[{"id": 1, "text": "a", "type": 10}]"#;
        assert!(matches!(
            QuestionSet::from_json(json),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_empty_set() {
        assert!(QuestionSet::from_json("[]").is_err());
    }

    #[test]
    fn test_unbalanced_set() {
        let json = r#"[
            {"id": 1, "text": "a", "type": 1},
            {"id": 2, "text": "b", "type": 1}
        ]"#;
        let set = QuestionSet::from_json(json).unwrap();
        assert!(!set.is_balanced());
        assert_eq!(set.items_per_type()[0].1, 2);
        assert_eq!(set.items_per_type()[8].1, 0);
    }

    #[test]
    fn test_serde_roundtrip_rebuilds_index() {
        let set = QuestionSet::from_json(sample_questions_json()).unwrap();
        let json = set.to_json().unwrap();
        let loaded: QuestionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.get(7).unwrap().text, "I keep my options open");
    }
}
