//! Per-client session slots holding the current answering chain.
//!
//! A slot is either empty (no video processed yet) or holds the chain of the
//! most recently processed video. Slots are replaced whole.

use crate::config::SessionSettings;
use crate::error::{Result, VidragError};
use crate::rag::RagChain;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Key of a session slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub const MAX_LEN: usize = 128;

    /// Accepts 1 to 128 ASCII letters, digits, `-` or `_`.
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(VidragError::InvalidInput(format!("Invalid session id: {:?}", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for session slots.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The chain currently held by a session, if any.
    async fn get(&self, id: &SessionId) -> Option<Arc<RagChain>>;

    /// Atomically install a chain, replacing any previous one.
    async fn replace(&self, id: SessionId, chain: Arc<RagChain>);

    /// Empty a slot. Returns whether it held a chain.
    async fn remove(&self, id: &SessionId) -> bool;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}

struct Entry {
    chain: Arc<RagChain>,
    created_at: DateTime<Utc>,
}

/// Process-memory session store with TTL and capacity eviction.
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, Entry>>,
    max_sessions: usize,
    ttl: Option<Duration>,
}

impl MemorySessionStore {
    /// `ttl` of `None` keeps sessions until evicted by capacity.
    pub fn new(max_sessions: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        // Zero or out-of-range values disable expiry.
        let ttl = i64::try_from(settings.ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds);
        Self::new(settings.max_sessions, ttl)
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - entry.created_at >= ttl)
    }

    pub(crate) async fn insert_at(&self, id: SessionId, chain: Arc<RagChain>, created_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let now = Utc::now();

        entries.retain(|_, e| !self.is_expired(e, now));
        entries.insert(id, Entry { chain, created_at });

        while entries.len() > self.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting session {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::from_settings(&SessionSettings::default())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Option<Arc<RagChain>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(id) {
                None => return None,
                Some(entry) if !self.is_expired(entry, now) => return Some(entry.chain.clone()),
                Some(_) => {}
            }
        }

        debug!("Session {} expired", id);
        let mut entries = self.entries.write().await;
        if entries.get(id).is_some_and(|e| self.is_expired(e, now)) {
            entries.remove(id);
        }
        None
    }

    async fn replace(&self, id: SessionId, chain: Arc<RagChain>) {
        self.insert_at(id, chain, Utc::now()).await;
    }

    async fn remove(&self, id: &SessionId) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !self.is_expired(e, now))
            .count()
    }
}
