//! Records kept by the memory layer
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::utils::TextUtils;

/// One completed prompt/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub prompt_type: String,
    pub user_input: String,
    pub response: String,
    pub session_id: String,
}

impl ConversationEntry {
    pub const USER_INPUT_LIMIT: usize = 500;
    pub const RESPONSE_LIMIT: usize = 1000;

    /// Builds an entry, truncating input and response to their stored limits.
    pub fn new(prompt_type: &str, user_input: &str, response: &str, session_id: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            prompt_type: prompt_type.to_string(),
            user_input: TextUtils::truncate_chars(user_input, Self::USER_INPUT_LIMIT).into_owned(),
            response: TextUtils::truncate_chars(response, Self::RESPONSE_LIMIT).into_owned(),
            session_id: session_id.to_string(),
        }
    }
}

/// Rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutOfRange(pub i64);

impl fmt::Display for ScoreOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "score must be between {} and {}, got {}", Score::MIN, Score::MAX, self.0)
    }
}

impl std::error::Error for ScoreOutOfRange {}

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ScoreOutOfRange> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(ScoreOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Scores below 3 are the only ones that can teach the hint store.
    pub fn is_negative(self) -> bool {
        self.0 < 3
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value as i64)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub prompt_type: String,
    pub score: Score,
    pub text: String,
}

/// Persisted shape of the memory store. `user_preferences` and
/// `conversation_patterns` are reserved and currently never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryData {
    #[serde(default)]
    pub user_preferences: HashMap<String, String>,
    #[serde(default)]
    pub prompt_improvements: HashMap<String, String>,
    #[serde(default)]
    pub feedback_history: Vec<FeedbackEntry>,
    #[serde(default)]
    pub conversation_patterns: HashMap<String, String>,
}

/// Persisted shape of the conversations store: session id to entries.
pub type ConversationMap = HashMap<String, Vec<ConversationEntry>>;
