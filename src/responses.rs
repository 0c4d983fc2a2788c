//! Response intake
//!
//! Converts submitted answers into [`Response`] records. Two encodings are
//! accepted: an array of `{"item_id", "value"}` objects, or the form-style
//! answer map `{"q_<id>": <value>}`.

use crate::error::EngineError;
use crate::types::{Response, MAX_ANSWER, MIN_ANSWER};
use std::collections::BTreeMap;

/// Prefix used by answer map keys
pub const ANSWER_KEY_PREFIX: &str = "q_";

/// Parse an answer key such as `q_12` into its item id
pub fn parse_answer_key(key: &str) -> Result<u32, EngineError> {
    key.strip_prefix(ANSWER_KEY_PREFIX)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| EngineError::InvalidAnswerKey(key.to_string()))
}

/// Convert an answer map into responses sorted by item id
pub fn from_answer_map(answers: &BTreeMap<String, i64>) -> Result<Vec<Response>, EngineError> {
    let mut responses = answers
        .iter()
        .map(|(key, &value)| {
            let item_id = parse_answer_key(key)?;
            Ok(Response::new(item_id, checked_value(item_id, value)?))
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    responses.sort_by_key(|r| r.item_id);
    Ok(responses)
}

/// Parse responses from JSON, accepting either an array or an answer map
pub fn parse_json(json: &str) -> Result<Vec<Response>, EngineError> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    if value.is_object() {
        let answers: BTreeMap<String, i64> = serde_json::from_value(value)?;
        from_answer_map(&answers)
    } else {
        let raw: Vec<RawResponse> = serde_json::from_value(value)?;
        raw.into_iter()
            .map(|r| Ok(Response::new(r.item_id, checked_value(r.item_id, r.value)?)))
            .collect()
    }
}

#[derive(serde::Deserialize)]
struct RawResponse {
    item_id: u32,
    value: i64,
}

fn checked_value(item_id: u32, value: i64) -> Result<u8, EngineError> {
    if (i64::from(MIN_ANSWER)..=i64::from(MAX_ANSWER)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(EngineError::InvalidResponseValue { item_id, value })
    }
}
