pub mod api;
pub mod config;
pub mod error;
pub mod llm_client;
pub mod memory;
pub mod metrics;
pub mod server;
pub mod session;
pub mod shared_state;
pub mod telemetry;
pub mod templates;
pub mod uploads;
pub mod utils;

// Public API exports
pub use config::Config;
pub use error::{AssistError, AssistResult, GenerationError};
pub use llm_client::{GeminiClient, ScriptedGenerator, TextGenerator};
pub use server::{build_router, run_server};
pub use shared_state::{MemoryStats, PromptRun, SharedState, UnifiedAppState};
