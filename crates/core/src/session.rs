//! In-memory session history.
//!
//! Maps a client-chosen session identifier to the ordered list of exchanges
//! made under it. History lives for the lifetime of the process; there is no
//! eviction, size cap or expiry. Durable records belong to the audit sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// One question/answer pair. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    #[serde(serialize_with = "crate::time::serialize_iso")]
    pub timestamp: DateTime<Utc>,
}

/// Process-wide session history.
///
/// Thread-safe via `std::sync::RwLock` (non-async, held only for the append
/// or the copy-out, never across an await). A poisoned lock is recovered so
/// that `record` cannot fail.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<Exchange>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange, creating the session on first use.
    pub fn record(
        &self,
        session_id: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) {
        let exchange = Exchange {
            question: question.into(),
            answer: answer.into(),
            timestamp,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(exchange);
    }

    /// The full ordered history for a session; empty if it was never used.
    pub fn read(&self, session_id: &str) -> Vec<Exchange> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Number of exchanges recorded for a session.
    pub fn count(&self, session_id: &str) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).map_or(0, Vec::len)
    }

    /// Number of distinct sessions seen since startup.
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
