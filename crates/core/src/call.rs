//! Call session and conversation turn types
//!
//! A `CallSession` is the per-call conversation state: bounded message
//! history, language, and timestamps. It is exclusively owned by the session
//! store; nothing else mutates it directly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Per-call conversation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    /// Opaque call identifier, vendor-assigned
    pub call_id: String,
    pub language: Language,
    /// Ordered turns, capped by the store's history limit
    pub messages: Vec<Turn>,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>, language: Language) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            language,
            messages: Vec::new(),
            start_time: now,
            last_updated: now,
            metadata: None,
        }
    }

    /// Append a turn, evicting the oldest once `max_history` is exceeded.
    ///
    /// Oldest-first eviction keeps the most recent conversational context for
    /// the generator.
    pub fn push_turn(&mut self, turn: Turn, max_history: usize) {
        self.messages.push(turn);
        while self.messages.len() > max_history {
            self.messages.remove(0);
        }
        self.last_updated = Utc::now();
    }

    /// Elapsed call duration in seconds
    pub fn duration_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }

    /// Whether the session has been inactive longer than `ttl`
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.last_updated > ttl
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_cap_evicts_oldest_first() {
        let mut session = CallSession::new("c1", Language::EnUs);
        for i in 0..12 {
            session.push_turn(Turn::user(format!("msg {}", i)), 10);
        }
        assert_eq!(session.message_count(), 10);
        // msgs 0 and 1 dropped, most recent retained
        assert_eq!(session.messages[0].content, "msg 2");
        assert_eq!(session.messages[9].content, "msg 11");
    }

    #[test]
    fn push_touches_last_updated() {
        let mut session = CallSession::new("c1", Language::EnUs);
        let before = session.last_updated;
        session.push_turn(Turn::assistant("hello"), 10);
        assert!(session.last_updated >= before);
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = CallSession::new("c1", Language::EnUs);
        assert!(!session.is_expired(Duration::seconds(3600)));
        // zero TTL expires immediately on the next tick
        assert_eq!(session.message_count(), 0);
    }
}
