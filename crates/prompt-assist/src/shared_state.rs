//! Shared application state
//!
//! One [`SharedState`] owns every store and the generation backend. Handlers
//! receive it through [`UnifiedAppState`] and call the operation methods
//! here; nothing below this layer knows about HTTP.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{AssistError, AssistResult},
    llm_client::{GeminiClient, TextGenerator},
    memory::{
        ConversationEntry, ConversationStore, HintUpdate, MemoryStore, PromptAugmenter, Score,
    },
    metrics,
    session::SessionManager,
    templates::{self, PromptTemplate, TemplateRegistry},
    uploads::UploadIndex,
    utils::TextUtils,
};

/// Outcome of a successful prompt run.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRun {
    pub response: String,
    pub prompt_name: String,
    pub session_id: String,
    pub conversation_count: usize,
    /// True when this run allocated the session; the caller must issue the cookie.
    #[serde(skip)]
    pub new_session: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_conversations: usize,
    pub total_sessions: usize,
    pub feedback_count: usize,
    pub improved_prompts: usize,
}

pub struct SharedState {
    pub config: Arc<Config>,
    pub templates: TemplateRegistry,
    pub memory: MemoryStore,
    pub conversations: ConversationStore,
    pub sessions: SessionManager,
    pub uploads: UploadIndex,
    pub generator: Arc<dyn TextGenerator>,
}

impl SharedState {
    /// Load both durable stores and wire in `generator`.
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        info!("Initializing shared state (generator: {})", generator.model_name());
        let memory = MemoryStore::load(&config.memory_file);
        let conversations = ConversationStore::load(&config.conversation_file);
        let sessions = SessionManager::new(&config.secret_key);
        let uploads = UploadIndex::new(
            config.upload_folder.clone(),
            config.allowed_extensions.clone(),
        );

        Self {
            config: Arc::new(config),
            templates: TemplateRegistry::with_premade(),
            memory,
            conversations,
            sessions,
            uploads,
            generator,
        }
    }

    /// Production wiring: the Gemini client configured from `config`.
    pub fn with_gemini(config: Config) -> Self {
        let client = GeminiClient::new(
            &config.gemini_base_url,
            &config.gemini_model,
            &config.gemini_api_key,
            Duration::from_secs(config.generate_timeout_seconds),
        );
        Self::new(config, Arc::new(client))
    }

    /// Validate, augment with session context and hints, generate, then
    /// record the exchange. A failed generation records nothing.
    pub async fn run_prompt(
        &self,
        session: Option<String>,
        prompt_type: &str,
        user_input: &str,
    ) -> AssistResult<PromptRun> {
        let template = self
            .templates
            .get(prompt_type)
            .ok_or_else(|| AssistError::validation("Invalid prompt type"))?;
        if TextUtils::is_blank(user_input) {
            return Err(AssistError::validation("Please provide input"));
        }

        let (session_id, new_session) = match session {
            Some(id) => (id, false),
            None => (self.sessions.new_id(), true),
        };

        let augmented = PromptAugmenter::new(&self.memory, &self.conversations).enhance(
            &template.prompt,
            prompt_type,
            user_input,
            &session_id,
        );
        let full_prompt = templates::render(&augmented, user_input);

        let started = Instant::now();
        let result = self.generator.generate(&full_prompt).await;
        metrics::observe_generation(started.elapsed().as_secs_f64());
        let response = result.map_err(|e| {
            warn!("Generation failed for {}: {}", prompt_type, e);
            AssistError::from(e)
        })?;

        let entry = ConversationEntry::new(prompt_type, user_input, &response, &session_id);
        let conversation_count = self.sessions.record_turn(&session_id);
        self.conversations.record(entry);
        metrics::set_active_sessions(self.sessions.active_sessions());
        info!(
            "Ran {} for session {} ({} turns this session)",
            prompt_type, session_id, conversation_count
        );

        Ok(PromptRun {
            response,
            prompt_name: template.name,
            session_id,
            conversation_count,
            new_session,
        })
    }

    /// Register or overwrite a template. Returns whether an existing one was replaced.
    pub fn add_prompt(
        &self,
        id: &str,
        name: &str,
        description: &str,
        prompt: &str,
    ) -> AssistResult<bool> {
        if [id, name, description, prompt].iter().any(|f| f.is_empty()) {
            return Err(AssistError::validation("All fields are required"));
        }
        Ok(self.templates.insert(id, PromptTemplate::new(name, description, prompt)))
    }

    /// An absent or zero `score` counts as missing, matching an unset form field.
    pub fn submit_feedback(
        &self,
        prompt_type: &str,
        score: Option<i64>,
        feedback_text: &str,
    ) -> AssistResult<HintUpdate> {
        let score = score.unwrap_or_default();
        if prompt_type.is_empty() || score == 0 {
            return Err(AssistError::validation("Missing required fields"));
        }
        let score = Score::new(score).map_err(|e| AssistError::validation(e.to_string()))?;
        Ok(self.memory.learn_from_feedback(prompt_type, score, feedback_text))
    }

    pub fn history(&self, session: Option<&str>) -> Vec<ConversationEntry> {
        session
            .map(|id| self.conversations.history(id))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_conversations: self.conversations.total_conversations(),
            total_sessions: self.conversations.total_sessions(),
            feedback_count: self.memory.feedback_count(),
            improved_prompts: self.memory.improved_prompts(),
        }
    }
}

/// Unified application state for all API handlers.
#[derive(Clone)]
pub struct UnifiedAppState {
    pub shared_state: Arc<SharedState>,
}

impl UnifiedAppState {
    pub fn new(shared_state: Arc<SharedState>) -> Self {
        Self { shared_state }
    }
}

impl std::ops::Deref for UnifiedAppState {
    type Target = SharedState;

    fn deref(&self) -> &SharedState {
        &self.shared_state
    }
}
