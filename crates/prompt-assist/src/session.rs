//! Browser sessions: a signed `session` cookie plus a volatile per-session
//! turn count. The entries themselves live in the conversation store.

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

const KEY_CONTEXT: &str = "prompt-assist 2024 session cookie mac";

pub struct SessionManager {
    key: [u8; 32],
    turns: DashMap<String, usize>,
}

impl SessionManager {
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            turns: DashMap::new(),
        }
    }

    /// Allocate a fresh session id. It is tracked from its first
    /// [`record_turn`](Self::record_turn).
    pub fn new_id(&self) -> String {
        let id = Uuid::new_v4().to_string();
        debug!("Allocated session {}", id);
        id
    }

    /// Cookie value for `id`: `<id>.<hex mac>`.
    pub fn sign(&self, id: &str) -> String {
        format!("{}.{}", id, blake3::keyed_hash(&self.key, id.as_bytes()).to_hex())
    }

    /// Return the session id carried by a cookie value, or `None` if it was
    /// not produced by [`sign`](Self::sign) under the same key.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (id, mac) = value.rsplit_once('.')?;
        Uuid::parse_str(id).ok()?;
        let presented = blake3::Hash::from_hex(mac).ok()?;
        // Hash equality is constant-time.
        if presented == blake3::keyed_hash(&self.key, id.as_bytes()) {
            Some(id.to_string())
        } else {
            None
        }
    }

    /// Session id from the request's `Cookie` headers, if a valid one is present.
    pub fn from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE)
            .find_map(|(_, value)| self.verify(value))
    }

    /// `Set-Cookie` header value for `id`.
    pub fn set_cookie(&self, id: &str) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax",
            SESSION_COOKIE,
            self.sign(id)
        )
    }

    /// Count one more turn for `id`, starting from zero if this process has
    /// not seen the session yet. Returns the new count.
    pub fn record_turn(&self, id: &str) -> usize {
        let mut turns = self.turns.entry(id.to_string()).or_default();
        *turns += 1;
        *turns
    }

    /// Sessions with at least one turn in this process. Never shrinks.
    pub fn active_sessions(&self) -> usize {
        self.turns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn signed_value_verifies() {
        let sessions = SessionManager::new("secret");
        let id = sessions.new_id();
        assert_eq!(sessions.verify(&sessions.sign(&id)), Some(id));
    }

    #[test]
    fn tampered_or_foreign_values_are_rejected() {
        let sessions = SessionManager::new("secret");
        let id = sessions.new_id();
        let signed = sessions.sign(&id);

        let other_id = Uuid::new_v4().to_string();
        let (_, mac) = signed.rsplit_once('.').unwrap();
        assert_eq!(sessions.verify(&format!("{other_id}.{mac}")), None);
        assert_eq!(sessions.verify(&id), None);
        assert_eq!(sessions.verify("not-a-uuid.abcd"), None);

        let other_key = SessionManager::new("different");
        assert_eq!(other_key.verify(&signed), None);
    }

    #[test]
    fn reads_session_from_cookie_header() {
        let sessions = SessionManager::new("secret");
        let id = sessions.new_id();
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {}={}", SESSION_COOKIE, sessions.sign(&id));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        assert_eq!(sessions.from_headers(&headers), Some(id));
        assert_eq!(sessions.from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn set_cookie_has_attributes() {
        let sessions = SessionManager::new("secret");
        let cookie = sessions.set_cookie("abc");
        assert!(cookie.starts_with("session=abc."));
        assert!(cookie.ends_with("; HttpOnly; Path=/; SameSite=Lax"));
    }

    #[test]
    fn turns_are_counted_per_session() {
        let sessions = SessionManager::new("secret");
        let a = sessions.new_id();
        assert_eq!(sessions.active_sessions(), 0);
        assert_eq!(sessions.record_turn(&a), 1);
        assert_eq!(sessions.record_turn(&a), 2);

        // Unknown ids (e.g. cookies from before a restart) start counting at one.
        assert_eq!(sessions.record_turn("restored"), 1);
        assert_eq!(sessions.active_sessions(), 2);
    }
}
