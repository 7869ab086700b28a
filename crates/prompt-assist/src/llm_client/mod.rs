//! Generation backend seam.
//!
//! Handlers only see [`TextGenerator`]; the production backend is
//! [`GeminiClient`], tests plug in [`ScriptedGenerator`].

pub mod gemini_client;

pub use gemini_client::GeminiClient;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::GenerationError;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a fully assembled prompt and return the model's plain text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_name(&self) -> &str;
}

/// Replays queued outcomes in order and remembers every prompt it received.
/// Once the queue is empty it echoes the prompt back.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.lock_replies().push_back(Ok(reply.into()));
        self
    }

    pub fn push_error(&self, error: GenerationError) -> &Self {
        self.lock_replies().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GenerationError>>> {
        self.replies.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(prompt.to_string());
        self.lock_replies()
            .pop_front()
            .unwrap_or_else(|| Ok(prompt.to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_generator_replays_in_order() {
        let generator = ScriptedGenerator::new();
        generator.push_reply("one").push_error(GenerationError::Empty);

        tokio_test::block_on(async {
            assert_eq!(generator.generate("p1").await.unwrap(), "one");
            assert!(matches!(generator.generate("p2").await, Err(GenerationError::Empty)));
            assert_eq!(generator.generate("echo").await.unwrap(), "echo");
        });
        assert_eq!(generator.prompts(), vec!["p1", "p2", "echo"]);
    }
}
