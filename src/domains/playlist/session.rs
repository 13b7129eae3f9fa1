//! User sessions and their cached catalog credentials.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Provider key for Last.fm credentials.
pub const LASTFM_PROVIDER: &str = "lastfm";

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;
/// Open sessions kept at most; the least recently used one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// A credential cached for one provider.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(skip)]
    tokens: HashMap<String, CachedToken>,
}

impl Session {
    fn is_idle(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.last_active + ttl <= now
    }

    /// Providers with a live credential.
    pub fn providers(&self) -> Vec<String> {
        let now = Utc::now();
        let mut providers: Vec<_> = self
            .tokens
            .iter()
            .filter(|(_, t)| !t.is_expired(now))
            .map(|(p, _)| p.clone())
            .collect();
        providers.sort();
        providers
    }
}

/// Shared session table. Sessions expire after `ttl` without use and the
/// table never holds more than `max_sessions`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_limits(
            Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            DEFAULT_MAX_SESSIONS,
        )
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Open a session for a user, pruning idle sessions first.
    pub async fn start(&self, user_id: impl Into<String>) -> Session {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            created_at: now,
            last_active: now,
            tokens: HashMap::new(),
        };
        info!("Session started for user '{}'", session.user_id);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle(self.ttl, now));
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_active)
                .map(|s| s.id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
        }
        if sessions.len() < before {
            debug!("Dropped {} stale session(s)", before - sessions.len());
        }
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Look up a live session and mark it used. Idle sessions are removed.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        if session.is_idle(self.ttl, now) {
            info!("Session expired for user '{}'", session.user_id);
            sessions.remove(session_id);
            return None;
        }
        session.last_active = now;
        Some(session.clone())
    }

    /// Cache a credential. `ttl` of `None` never expires.
    /// Returns false when the session does not exist.
    pub async fn cache_token(
        &self,
        session_id: &str,
        provider: &str,
        token: impl Into<String>,
        ttl: Option<Duration>,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.tokens.insert(
                    provider.to_string(),
                    CachedToken {
                        value: token.into(),
                        expires_at: ttl.map(|ttl| Utc::now() + ttl),
                    },
                );
                debug!("Cached {} credential for session {}", provider, session_id);
                true
            }
            None => false,
        }
    }

    /// Live credential for a provider. Expired credentials are evicted.
    pub async fn token(&self, session_id: &str, provider: &str) -> Option<String> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            let session = sessions.get(session_id)?;
            if session.is_idle(self.ttl, now) {
                return None;
            }
            let cached = session.tokens.get(provider)?;
            if !cached.is_expired(now) {
                return Some(cached.value.clone());
            }
        }
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.tokens.remove(provider);
        }
        None
    }

    /// Close a session, returning it if it existed.
    pub async fn end(&self, session_id: &str) -> Option<Session> {
        let removed = self.sessions.write().await.remove(session_id);
        if let Some(session) = &removed {
            info!("Session ended for user '{}'", session.user_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_end_session() {
        let store = SessionStore::new();
        let session = store.start("alice").await;
        assert_eq!(store.get(&session.id).await.unwrap().user_id, "alice");

        let ended = store.end(&session.id).await.unwrap();
        assert_eq!(ended.user_id, "alice");
        assert!(store.get(&session.id).await.is_none());
        assert!(store.end(&session.id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.start("alice").await;
        let b = store.start("alice").await;
        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_token_cache() {
        let store = SessionStore::new();
        let session = store.start("alice").await;
        assert!(store.cache_token(&session.id, LASTFM_PROVIDER, "k1", None).await);
        assert_eq!(store.token(&session.id, LASTFM_PROVIDER).await.as_deref(), Some("k1"));
        assert_eq!(store.get(&session.id).await.unwrap().providers(), vec!["lastfm"]);
        assert!(store.token(&session.id, "spotify").await.is_none());
        assert!(!store.cache_token("missing", LASTFM_PROVIDER, "k1", None).await);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = SessionStore::with_limits(Duration::seconds(-1), 10);
        let session = store.start("alice").await;
        store.cache_token(&session.id, LASTFM_PROVIDER, "k1", None).await;
        assert!(store.token(&session.id, LASTFM_PROVIDER).await.is_none());
        assert!(store.get(&session.id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_start_prunes_idle_sessions() {
        let store = SessionStore::with_limits(Duration::seconds(-1), 10);
        for _ in 0..5 {
            store.start("drive-by").await;
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = SessionStore::with_limits(Duration::hours(1), 2);
        let first = store.start("alice").await;
        let second = store.start("bob").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(store.get(&first.id).await.is_some());

        let third = store.start("carol").await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(&second.id).await.is_none());
        assert!(store.get(&first.id).await.is_some());
        assert!(store.get(&third.id).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_token_is_evicted() {
        let store = SessionStore::new();
        let session = store.start("alice").await;
        store
            .cache_token(&session.id, LASTFM_PROVIDER, "old", Some(Duration::seconds(-1)))
            .await;
        assert!(store.token(&session.id, LASTFM_PROVIDER).await.is_none());
        assert!(store.get(&session.id).await.unwrap().providers().is_empty());
    }
}
