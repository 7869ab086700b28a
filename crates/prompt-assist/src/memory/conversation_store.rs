use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::info;

use super::persistence;
use super::types::{ConversationEntry, ConversationMap};

/// Durable session id -> conversation log, rewritten after each new entry.
pub struct ConversationStore {
    path: PathBuf,
    sessions: RwLock<ConversationMap>,
}

impl ConversationStore {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let sessions: ConversationMap = persistence::load_or_default(&path, "conversations");
        info!(
            "Conversation store ready: {} sessions, {} entries",
            sessions.len(),
            sessions.values().map(Vec::len).sum::<usize>()
        );
        Self {
            path,
            sessions: RwLock::new(sessions),
        }
    }

    /// Appends the entry under its own session id and persists the whole map.
    /// Returns the number of stored entries for that session.
    pub fn record(&self, entry: ConversationEntry) -> usize {
        let (count, snapshot) = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            let log = sessions.entry(entry.session_id.clone()).or_default();
            log.push(entry);
            let count = log.len();
            (count, sessions.clone())
        };
        persistence::save(&self.path, &snapshot, "conversations");
        count
    }

    pub fn history(&self, session_id: &str) -> Vec<ConversationEntry> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Up to `limit` most recent entries of a session, oldest first.
    pub fn recent(&self, session_id: &str, limit: usize) -> Vec<ConversationEntry> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(session_id) {
            Some(log) => log[log.len().saturating_sub(limit)..].to_vec(),
            None => Vec::new(),
        }
    }

    pub fn total_conversations(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
