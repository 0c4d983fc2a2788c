//! Error types for the assessment engine

use thiserror::Error;

/// Errors that can occur while scoring or aggregating assessments
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Response references unknown item {item_id}")]
    UnknownItem { item_id: u32 },

    #[error("Incomplete response: missing answers for items {missing:?}")]
    IncompleteResponse { missing: Vec<u32> },

    #[error("No recorded results for team '{0}'")]
    EmptyTeam(String),

    #[error("Answer value {value} for item {item_id} is outside 1-5")]
    InvalidResponseValue { item_id: u32, value: i64 },

    #[error("Item {item_id} was answered more than once")]
    DuplicateResponse { item_id: u32 },

    #[error("Invalid type id: {0} (expected 1-9)")]
    InvalidType(u8),

    #[error("Invalid question set: {0}")]
    InvalidQuestionSet(String),

    #[error("Invalid answer key: {0}")]
    InvalidAnswerKey(String),

    #[error("Invalid display name: {0}")]
    InvalidDisplayName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
