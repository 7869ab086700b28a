//! Memory module - conversation log, feedback learning and prompt augmentation
pub mod types;
pub mod persistence;
pub mod memory_store;
pub mod conversation_store;
pub mod augment;

pub use types::{
    ConversationEntry, ConversationMap, FeedbackEntry, MemoryData, Score, ScoreOutOfRange,
};
pub use memory_store::{apply_feedback, HintUpdate, MemoryStore};
pub use conversation_store::ConversationStore;
pub use augment::{augment_prompt, PromptAugmenter};
