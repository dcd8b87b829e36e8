//! Per-client session state keyed by a signed cookie.
//!
//! The store only knows `get`/`set` on string values. Which backing store holds
//! them is the caller's choice; the process ships with [`MemorySessionStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "interview_session";

/// Session key holding the most recently uploaded résumé text.
pub const CV_CONTENT: &str = "cv_content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Reads the session id from the signed cookie, or issues a new one.
///
/// A missing, tampered, or unparsable cookie starts a fresh session. The
/// returned jar must be sent back with the response so a new id sticks.
pub fn resolve_session(jar: SignedCookieJar) -> (SessionId, SignedCookieJar) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (SessionId(id), jar);
    }

    let id = SessionId::new();
    debug!(session = %id, "Issuing new session");
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (id, jar.add(cookie))
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: SessionId, key: &str) -> Option<String>;

    /// Overwrites any previous value under `key`. Last write wins.
    async fn set(&self, session: SessionId, key: &str, value: String);
}

struct SessionEntry {
    values: HashMap<String, String>,
    touched_at: DateTime<Utc>,
}

/// Process-local session store with idle expiry.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.touched_at > self.ttl
    }

    /// Drops every session idle for longer than the TTL. Returns how many went.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Purges idle sessions from `store` every `every`. Runs until the task is dropped.
pub async fn sweep_expired(store: Arc<MemorySessionStore>, every: std::time::Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let removed = store.purge_expired().await;
        if removed > 0 {
            let remaining = store.len().await;
            debug!(removed, remaining, "Expired sessions purged");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: SessionId, key: &str) -> Option<String> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&session)?;
        if self.is_expired(entry, now) {
            sessions.remove(&session);
            return None;
        }
        entry.touched_at = now;
        entry.values.get(key).cloned()
    }

    async fn set(&self, session: SessionId, key: &str, value: String) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            touched_at: now,
        });
        if self.is_expired(entry, now) {
            entry.values.clear();
        }
        entry.touched_at = now;
        entry.values.insert(key.to_string(), value);
    }
}
