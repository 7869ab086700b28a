//! Prompt augmentation with session context and learned hints.
//!
//! The template is never edited in place: context is appended after it so
//! the `{user_input}` placeholder survives for the caller to fill in.

use super::conversation_store::ConversationStore;
use super::memory_store::MemoryStore;
use super::types::ConversationEntry;
use crate::utils::TextUtils;

/// How many earlier turns of the session are replayed.
pub const CONTEXT_TURNS: usize = 3;
/// Characters of each earlier input that are replayed.
pub const CONTEXT_INPUT_CHARS: usize = 100;

const CONTEXT_HEADER: &str = "\n\nPrevious context from this session:\n";
const HINT_LEAD_IN: &str = "\n\nBased on previous interactions, please focus on: ";

/// Reads both stores and produces the augmented template. No side effects.
pub struct PromptAugmenter<'a> {
    memory: &'a MemoryStore,
    conversations: &'a ConversationStore,
}

impl<'a> PromptAugmenter<'a> {
    pub fn new(memory: &'a MemoryStore, conversations: &'a ConversationStore) -> Self {
        Self { memory, conversations }
    }

    /// `_user_input` is accepted for call-site symmetry; the current input
    /// is substituted afterwards by the template renderer.
    pub fn enhance(
        &self,
        template: &str,
        template_id: &str,
        _user_input: &str,
        session_id: &str,
    ) -> String {
        let recent = self.conversations.recent(session_id, CONTEXT_TURNS);
        let hint = self.memory.improvement_hint(template_id);
        augment_prompt(template, &recent, hint.as_deref())
    }
}

pub fn augment_prompt(template: &str, recent: &[ConversationEntry], hint: Option<&str>) -> String {
    let mut enhanced = template.to_string();

    if !recent.is_empty() {
        enhanced.push_str(CONTEXT_HEADER);
        let start = recent.len().saturating_sub(CONTEXT_TURNS);
        for conv in &recent[start..] {
            enhanced.push_str("- ");
            enhanced.push_str(&conv.prompt_type);
            enhanced.push_str(": ");
            enhanced.push_str(&TextUtils::truncate_chars(&conv.user_input, CONTEXT_INPUT_CHARS));
            enhanced.push_str("...\n");
        }
    }

    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        enhanced.push_str(HINT_LEAD_IN);
        enhanced.push_str(hint);
    }

    enhanced
}
