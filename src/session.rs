//! Per-browser session state
//!
//! Each session owns one conversation. Sessions are created on first
//! access, ended explicitly or by going idle, and never share state.

use crate::conversation::Conversation;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Sessions idle longer than this are dropped
pub const DEFAULT_IDLE_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Live sessions kept before the least recently seen one is evicted
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Shared handle to one session's conversation.
///
/// The mutex is held for a whole submission, so each session has at most
/// one completion in flight.
pub type SharedConversation = Arc<Mutex<Conversation>>;

struct SessionEntry {
    conversation: SharedConversation,
    last_seen: Instant,
}

/// A session resolved for one request
pub struct Session {
    pub id: String,
    pub conversation: SharedConversation,
    /// True when this request started the session
    pub created: bool,
}

/// Session-keyed conversation store
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_limit: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(idle_limit: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_limit,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up the session for `id`, creating a fresh one if needed.
    ///
    /// Idempotent for a live session: the existing conversation is returned
    /// untouched. Unknown or expired ids get a newly minted id rather than
    /// being adopted.
    pub async fn initialize(&self, id: Option<&str>) -> Session {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_limit);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, "Dropped idle sessions");
        }

        if let Some((id, entry)) = id.and_then(|id| sessions.get_mut(id).map(|e| (id, e))) {
            entry.last_seen = now;
            return Session {
                id: id.to_string(),
                conversation: entry.conversation.clone(),
                created: false,
            };
        }

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::warn!(
                    session = %oldest,
                    limit = self.max_sessions,
                    "Session store full, evicted least recently seen"
                );
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let conversation = Arc::new(Mutex::new(Conversation::new()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                conversation: conversation.clone(),
                last_seen: now,
            },
        );
        tracing::info!(session = %id, "Session started");

        Session {
            id,
            conversation,
            created: true,
        }
    }

    /// End a session, destroying its conversation. Returns false if unknown.
    pub async fn end(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Session ended");
        }
        removed
    }

    #[allow(dead_code)] // Used by tests
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_LIMIT, DEFAULT_MAX_SESSIONS)
    }
}
