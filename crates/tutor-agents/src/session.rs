//! Per-conversation state.
//!
//! Each conversation owns one [`LanguageDetector`], so language hysteresis
//! never leaks between students. The HTTP server keeps sessions in a
//! [`SessionStore`]; one-shot callers create a fresh session per run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use coordination::{LanguageDetectionResult, LanguageDetector, LanguageLabel};
use tokio::sync::Mutex;

/// Default cap on live sessions held by a store.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: String,
    detector: LanguageDetector,
    turns: u32,
    last_seen: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            detector: LanguageDetector::new(),
            turns: 0,
            last_seen: Utc::now(),
        }
    }

    /// Anonymous single-use session.
    pub fn ephemeral() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn language(&self) -> Option<LanguageLabel> {
        self.detector.last_detected()
    }

    /// Detect the language of the next user turn and advance the session.
    pub fn detect(
        &mut self,
        text: &str,
        preferred: Option<LanguageLabel>,
    ) -> LanguageDetectionResult {
        self.turns += 1;
        self.last_seen = Utc::now();
        self.detector.detect(text, preferred)
    }

    pub fn reset(&mut self) {
        self.detector.reset();
        self.turns = 0;
    }
}

pub type SharedSession = Arc<Mutex<ConversationSession>>;

/// Sessions keyed by id. Each session has its own lock, so concurrent
/// requests for different conversations never wait on each other.
///
/// Eviction order comes from the store's own access clock, never from the
/// session locks, so the cap holds even when every session is in use. An
/// evicted session stays alive for whoever still holds its handle.
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    max_sessions: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: HashMap<String, StoreEntry>,
    clock: u64,
}

#[derive(Debug)]
struct StoreEntry {
    session: SharedSession,
    last_access: u64,
}

impl StoreInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            tracing::debug!(session = %id, "evicting least recently used session");
            self.sessions.remove(&id);
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Fetch the session for `id`, creating it on first use.
    pub async fn get_or_create(&self, id: &str) -> SharedSession {
        let mut inner = self.inner.lock().await;
        let now = inner.tick();
        if let Some(entry) = inner.sessions.get_mut(id) {
            entry.last_access = now;
            return Arc::clone(&entry.session);
        }
        while inner.sessions.len() >= self.max_sessions {
            inner.evict_least_recent();
        }
        let session = Arc::new(Mutex::new(ConversationSession::new(id)));
        inner.sessions.insert(
            id.to_string(),
            StoreEntry {
                session: Arc::clone(&session),
                last_access: now,
            },
        );
        session
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.inner.lock().await.sessions.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_shares_detector_state() {
        let store = SessionStore::new();
        {
            let s = store.get_or_create("a").await;
            let r = s.lock().await.detect("नमस्ते, प्रकाश संश्लेषण समझाइए", None);
            assert_eq!(r.language, LanguageLabel::Hindi);
        }
        let s = store.get_or_create("a").await;
        let guard = s.lock().await;
        assert_eq!(guard.language(), Some(LanguageLabel::Hindi));
        assert_eq!(guard.turns(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.get_or_create("a").await;
        a.lock().await.detect("नमस्ते, प्रकाश संश्लेषण समझाइए", None);

        let b = store.get_or_create("b").await;
        assert_eq!(b.lock().await.language(), None);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn capacity_evicts_one_session() {
        let store = SessionStore::with_capacity(2);
        store.get_or_create("a").await;
        store.get_or_create("b").await;
        store.get_or_create("c").await;
        assert_eq!(store.len().await, 2);
        assert!(store.remove("c").await);
    }

    #[tokio::test]
    async fn capacity_holds_while_sessions_are_locked() {
        let store = SessionStore::with_capacity(2);
        let a = store.get_or_create("a").await;
        let b = store.get_or_create("b").await;
        let _a_busy = a.lock().await;
        let _b_busy = b.lock().await;

        store.get_or_create("c").await;
        assert_eq!(store.len().await, 2);
        assert!(!store.remove("a").await);
        assert!(store.remove("b").await);
        assert!(store.remove("c").await);
    }

    #[tokio::test]
    async fn recent_access_protects_from_eviction() {
        let store = SessionStore::with_capacity(2);
        store.get_or_create("a").await;
        store.get_or_create("b").await;
        store.get_or_create("a").await;

        store.get_or_create("c").await;
        assert!(store.remove("a").await);
        assert!(!store.remove("b").await);
    }

    #[test]
    fn reset_clears_language() {
        let mut s = ConversationSession::ephemeral();
        s.detect("What is the speed of light in vacuum?", None);
        assert_eq!(s.language(), Some(LanguageLabel::English));
        s.reset();
        assert_eq!(s.language(), None);
        assert_eq!(s.turns(), 0);
    }
}
