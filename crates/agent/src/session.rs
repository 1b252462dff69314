//! Call session store
//!
//! Per-call conversation state with the concurrency discipline the webhook
//! needs: operations on different call ids never block each other (sharded
//! `DashMap`), while turns for the same call id serialize on that call's
//! `tokio::sync::Mutex`. A turn holds the per-call lock across its await
//! points, so rapid duplicate events cannot interleave their appends.

use chrono::Duration as ChronoDuration;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use zoid_config::SessionConfig;
use zoid_core::{CallSession, Language, Turn, TurnRole};

/// Shared handle to one call's session, serialized by its mutex
pub type SessionHandle = Arc<Mutex<CallSession>>;

/// In-memory call session store
///
/// Single-process state. The handle-based interface keeps per-key
/// serialization as the contract so a distributed store can be substituted
/// without changing call sites.
pub struct CallSessionStore {
    sessions: DashMap<String, SessionHandle>,
    history_limit: usize,
    ttl: ChronoDuration,
}

impl CallSessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            history_limit: config.history_limit,
            ttl: ChronoDuration::seconds(config.ttl_secs as i64),
        }
    }

    pub fn with_limits(history_limit: usize, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            history_limit,
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(3600)),
        }
    }

    /// Create a session for a call, replacing any stale entry so at most one
    /// live session exists per call id.
    pub fn create(&self, call_id: &str, language: Language) -> SessionHandle {
        let handle = Arc::new(Mutex::new(CallSession::new(call_id, language)));
        self.sessions.insert(call_id.to_string(), handle.clone());
        tracing::info!(call_id = %call_id, language = %language, "Call session created");
        handle
    }

    /// Fetch a session handle. An expired session is removed and reported
    /// absent; a session with a turn in flight cannot be reaped mid-append
    /// because expiry is checked under the same per-call lock.
    pub async fn get(&self, call_id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.get(call_id).map(|e| e.value().clone())?;

        let expired = handle.lock().await.is_expired(self.ttl);
        if expired {
            self.sessions.remove(call_id);
            tracing::info!(call_id = %call_id, "Expired call session removed");
            return None;
        }
        Some(handle)
    }

    /// Append one turn. Returns the new message count, or `None` if the
    /// session is absent or expired; never a silent success.
    pub async fn append_turn(
        &self,
        call_id: &str,
        role: TurnRole,
        content: impl Into<String>,
    ) -> Option<usize> {
        let handle = self.get(call_id).await?;
        let mut session = handle.lock().await;
        session.push_turn(Turn::new(role, content), self.history_limit);
        Some(session.message_count())
    }

    /// Language of a live session, for caller-facing text on paths that no
    /// longer have the session in hand.
    pub async fn language(&self, call_id: &str) -> Option<Language> {
        let handle = self.get(call_id).await?;
        let language = handle.lock().await.language;
        Some(language)
    }

    /// End a call, dropping its session. Returns the final message count if
    /// the session existed.
    pub async fn end(&self, call_id: &str) -> Option<usize> {
        let (_, handle) = self.sessions.remove(call_id)?;
        let count = handle.lock().await.message_count();
        tracing::info!(call_id = %call_id, messages = count, "Call session ended");
        Some(count)
    }

    /// Drop all expired sessions. Sessions with a turn in flight are skipped;
    /// their `last_updated` will be fresh when the turn completes.
    pub fn purge_expired(&self) -> usize {
        let mut purged = 0;
        self.sessions.retain(|call_id, handle| {
            match handle.try_lock() {
                Ok(session) if session.is_expired(self.ttl) => {
                    tracing::info!(call_id = %call_id, "Purging expired call session");
                    purged += 1;
                    false
                },
                _ => true,
            }
        });
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}
