//! Server-side browser session state.
//!
//! A browser session is identified by the session cookie and holds:
//! - a string-keyed value map (the key-value state step-up relies on)
//! - the signed-in principal and the tokens saved at sign-in
//!
//! Sessions expire after a period of inactivity. Every successful load
//! slides the expiry forward.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use delegated_auth_core::{Result, SessionId};
use rootcause::Report;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

use crate::error::SessionStoreError;
use crate::principal::Principal;

/// String-keyed state scoped to one browser session.
pub trait SessionState {
    /// Returns the value stored under `key`.
    fn get_string(&self, key: &str) -> Option<&str>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_string(&mut self, key: &str, value: &str);

    /// Removes `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str);
}

impl SessionState for HashMap<String, String> {
    fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        HashMap::remove(self, key);
    }
}

/// Tokens returned by the provider at sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct SavedTokens {
    /// The raw ID token.
    pub id_token: String,
    /// The raw access token.
    pub access_token: String,
    /// The refresh token, if one was issued.
    pub refresh_token: Option<String>,
}

impl fmt::Debug for SavedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedTokens")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// A browser session as held by the store.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    id: SessionId,
    values: HashMap<String, String>,
    principal: Option<Principal>,
    tokens: Option<SavedTokens>,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates an empty, signed-out session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            values: HashMap::new(),
            principal: None,
            tokens: None,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Moves the session contents under a new identifier.
    ///
    /// Values survive, so state such as an outstanding step-up attempt is
    /// still visible after the sign-in round trip.
    #[must_use]
    pub fn renew(self, id: SessionId) -> Self {
        Self { id, ..self }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the signed-in principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the tokens saved at sign-in, if any.
    #[must_use]
    pub fn tokens(&self) -> Option<&SavedTokens> {
        self.tokens.as_ref()
    }

    /// Returns true if a principal is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Attaches the principal and tokens from a completed sign-in.
    pub fn sign_in(&mut self, principal: Principal, tokens: SavedTokens) {
        self.principal = Some(principal);
        self.tokens = Some(tokens);
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session was last loaded or saved.
    #[must_use]
    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    /// Returns true if the session has been idle for at least `idle_timeout`.
    #[must_use]
    pub fn is_idle_expired(&self, idle_timeout: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_accessed_at >= idle_timeout
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }
}

impl SessionState for SessionRecord {
    fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values.set_string(key, value);
    }

    fn remove(&mut self, key: &str) {
        SessionState::remove(&mut self.values, key);
    }
}

/// Persistence for browser sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session, sliding its idle expiry.
    ///
    /// Returns `None` for unknown or idle-expired sessions.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Inserts or replaces a session.
    async fn save(&self, record: &SessionRecord) -> Result<(), SessionStoreError>;

    /// Deletes a session. Deleting an unknown session is a no-op.
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    /// Evicts idle-expired sessions, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, SessionStoreError>;
}

/// Default number of sessions a [`MemorySessionStore`] holds.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// In-process session store.
///
/// The store holds at most `max_sessions` sessions. Saving a new session
/// into a full store first evicts idle-expired sessions and fails if none
/// could be evicted.
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, SessionRecord>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl MemorySessionStore {
    /// Creates an empty store that evicts sessions idle for `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle_timeout,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Sets the number of sessions the store holds.
    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Returns the number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no sessions are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let expired = match entries.get_mut(id) {
            None => return Ok(None),
            Some(record) if record.is_idle_expired(self.idle_timeout, now) => true,
            Some(record) => {
                record.touch(now);
                return Ok(Some(record.clone()));
            }
        };

        if expired {
            entries.remove(id);
            tracing::debug!(session_id = %id, "session idle timeout elapsed");
        }
        Ok(None)
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), SessionStoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&record.id()) && entries.len() >= self.max_sessions {
            entries.retain(|_, existing| !existing.is_idle_expired(self.idle_timeout, now));
            if entries.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "session store is full");
                return Err(Report::from(SessionStoreError::Unavailable {
                    details: format!("session capacity of {} reached", self.max_sessions),
                }));
            }
        }

        let mut record = record.clone();
        record.touch(now);
        entries.insert(record.id(), record);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionStoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, record| !record.is_idle_expired(self.idle_timeout, now));
        Ok((before - entries.len()) as u64)
    }
}
