//! Feedback history and the per-template improvement hints learned from it.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use super::persistence;
use super::types::{FeedbackEntry, MemoryData, Score};
use crate::utils::TextUtils;

/// Comments at or below this many characters are recorded but never learned from.
pub const MIN_LEARNABLE_CHARS: usize = 10;
const FIRST_HINT_PREFIX: &str = "Focus on: ";
const FIRST_HINT_CHARS: usize = 200;
const EXTRA_HINT_PREFIX: &str = "; Also consider: ";
const EXTRA_HINT_CHARS: usize = 100;

/// What a feedback submission did to the template's hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintUpdate {
    Unchanged,
    Started,
    Extended,
}

pub struct MemoryStore {
    path: PathBuf,
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    /// Reads the store from `path`, or starts empty if it is missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data: MemoryData = persistence::load_or_default(&path, "memory store");
        info!(
            "Memory store ready: {} feedback entries, {} hinted templates",
            data.feedback_history.len(),
            data.prompt_improvements.values().filter(|v| !v.is_empty()).count()
        );
        Self {
            path,
            data: RwLock::new(data),
        }
    }

    /// Records the feedback, possibly grows the hint, then persists.
    pub fn learn_from_feedback(
        &self,
        prompt_type: &str,
        score: Score,
        feedback_text: &str,
    ) -> HintUpdate {
        let (outcome, snapshot) = {
            let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
            let outcome = apply_feedback(&mut data, prompt_type, score, feedback_text);
            (outcome, data.clone())
        };
        debug!("Feedback for '{}' (score {}): {:?}", prompt_type, score.get(), outcome);
        persistence::save(&self.path, &snapshot, "memory store");
        outcome
    }

    /// The accumulated hint for a template, if any text has been learned.
    pub fn improvement_hint(&self, prompt_type: &str) -> Option<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.prompt_improvements
            .get(prompt_type)
            .filter(|hint| !hint.is_empty())
            .cloned()
    }

    pub fn feedback_count(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).feedback_history.len()
    }

    /// Number of templates whose hint is non-empty.
    pub fn improved_prompts(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .prompt_improvements
            .values()
            .filter(|hint| !hint.is_empty())
            .count()
    }
}

/// The learning rule. History always grows; the hint only changes for a
/// negative score with a comment longer than [`MIN_LEARNABLE_CHARS`].
pub fn apply_feedback(
    data: &mut MemoryData,
    prompt_type: &str,
    score: Score,
    feedback_text: &str,
) -> HintUpdate {
    let hint = data
        .prompt_improvements
        .entry(prompt_type.to_string())
        .or_default();

    data.feedback_history.push(FeedbackEntry {
        timestamp: Utc::now(),
        prompt_type: prompt_type.to_string(),
        score,
        text: feedback_text.to_string(),
    });

    if !score.is_negative() || TextUtils::char_len(feedback_text) <= MIN_LEARNABLE_CHARS {
        return HintUpdate::Unchanged;
    }

    if hint.is_empty() {
        hint.push_str(FIRST_HINT_PREFIX);
        hint.push_str(&TextUtils::truncate_chars(feedback_text, FIRST_HINT_CHARS));
        HintUpdate::Started
    } else {
        hint.push_str(EXTRA_HINT_PREFIX);
        hint.push_str(&TextUtils::truncate_chars(feedback_text, EXTRA_HINT_CHARS));
        HintUpdate::Extended
    }
}
