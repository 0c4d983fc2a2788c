//! Score calculation
//!
//! Reduces a complete response set against a question set into a per-type
//! score vector:
//! - Reverse-scored items contribute `6 - value`
//! - Contributions are summed per type, never averaged
//! - Submissions are rejected whole; nothing is partially scored or imputed

use crate::error::EngineError;
use crate::questions::QuestionSet;
use crate::types::{Response, ScoreVector, ValidityStats, MAX_ANSWER, MIN_ANSWER};
use std::collections::HashMap;
use tracing::debug;

/// Calculator turning responses into a score vector
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Compute the score vector for one participant.
    ///
    /// The result depends only on the set of `(item_id, value)` pairs, so any
    /// presentation order yields the same vector.
    pub fn compute(
        responses: &[Response],
        questions: &QuestionSet,
    ) -> Result<ScoreVector, EngineError> {
        let answers = index_responses(responses, questions)?;

        let missing: Vec<u32> = questions
            .items()
            .iter()
            .filter(|item| !answers.contains_key(&item.id))
            .map(|item| item.id)
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::IncompleteResponse { missing });
        }

        let mut scores = ScoreVector::zeroed();
        for item in questions.items() {
            let value = answers[&item.id];
            scores.add(item.item_type, item.normalized_value(value));
        }

        debug!(items = questions.len(), scores = ?scores.as_array(), "Scores computed");
        Ok(scores)
    }
}

/// Convenience wrapper for [`ScoreCalculator::compute`]
pub fn compute_scores(
    responses: &[Response],
    questions: &QuestionSet,
) -> Result<ScoreVector, EngineError> {
    ScoreCalculator::compute(responses, questions)
}

/// Mean and population standard deviation of the raw answer values
pub fn validity_stats(responses: &[Response]) -> ValidityStats {
    if responses.is_empty() {
        return ValidityStats::default();
    }

    let n = responses.len() as f64;
    let mean = responses.iter().map(|r| f64::from(r.value)).sum::<f64>() / n;
    let variance = responses
        .iter()
        .map(|r| (f64::from(r.value) - mean).powi(2))
        .sum::<f64>()
        / n;

    ValidityStats {
        mean,
        sd: variance.sqrt(),
    }
}

/// Map item id to raw value, checking ids, value range and duplicates
fn index_responses(
    responses: &[Response],
    questions: &QuestionSet,
) -> Result<HashMap<u32, u8>, EngineError> {
    let mut answers = HashMap::with_capacity(responses.len());

    for response in responses {
        if questions.get(response.item_id).is_none() {
            return Err(EngineError::UnknownItem {
                item_id: response.item_id,
            });
        }
        if !(MIN_ANSWER..=MAX_ANSWER).contains(&response.value) {
            return Err(EngineError::InvalidResponseValue {
                item_id: response.item_id,
                value: i64::from(response.value),
            });
        }
        if answers.insert(response.item_id, response.value).is_some() {
            return Err(EngineError::DuplicateResponse {
                item_id: response.item_id,
            });
        }
    }

    Ok(answers)
}
