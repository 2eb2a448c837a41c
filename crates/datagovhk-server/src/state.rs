//! Shared state for request handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use datagovhk_tools::ToolRegistry;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Default idle time after which a session is forgotten (30 minutes).
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Ids of live MCP sessions with their last use.
///
/// Clients that exit without `DELETE` leave sessions behind, so idle ones
/// expire and the oldest is evicted once the store is full.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Instant>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    /// Create an empty store with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store holding at most `max_sessions` (at least one),
    /// each expiring after `idle_timeout` without use.
    pub fn with_limits(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Mint and record a new session id.
    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.inner.lock();

        let idle_timeout = self.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, last_used| now.duration_since(*last_used) < idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "expired idle MCP sessions");
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, last_used)| **last_used)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else { break };
            sessions.remove(&oldest);
            tracing::warn!(session_id = %oldest, "session limit reached, evicted oldest session");
        }

        sessions.insert(id.clone(), now);
        id
    }

    /// Check whether `id` is a live session, marking it as used.
    pub fn contains(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut sessions = self.inner.lock();
        match sessions.get_mut(id) {
            Some(last_used) if now.duration_since(*last_used) < self.idle_timeout => {
                *last_used = now;
                true
            }
            Some(_) => {
                sessions.remove(id);
                false
            }
            None => false,
        }
    }

    /// End a session. Returns `false` if it did not exist.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.lock().remove(id).is_some()
    }

    /// Number of recorded sessions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if there are no recorded sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JSON-RPC dispatcher over the tool registry.
    pub dispatcher: Arc<Dispatcher>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Live MCP sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// Create new application state.
    pub fn new(tools: ToolRegistry, config: ServerConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(tools)),
            config: Arc::new(config),
            sessions: SessionStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let sessions = SessionStore::new();
        assert!(sessions.is_empty());

        let id = sessions.create();
        assert_eq!(id.len(), 32);
        assert!(sessions.contains(&id));
        assert_eq!(sessions.len(), 1);

        assert!(sessions.remove(&id));
        assert!(!sessions.contains(&id));
        assert!(!sessions.remove(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_store_evicts_oldest() {
        let sessions = SessionStore::with_limits(2, Duration::from_secs(3600));
        let first = sessions.create();
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = sessions.create();
        tokio::time::advance(Duration::from_secs(1)).await;
        let third = sessions.create();

        assert_eq!(sessions.len(), 2);
        assert!(!sessions.contains(&first));
        assert!(sessions.contains(&second));
        assert!(sessions.contains(&third));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let sessions = SessionStore::with_limits(16, Duration::from_secs(60));
        let idle = sessions.create();
        let active = sessions.create();

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(sessions.contains(&active));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!sessions.contains(&idle));
        assert!(sessions.contains(&active));

        // Creating a session sweeps anything else that went idle.
        tokio::time::advance(Duration::from_secs(61)).await;
        sessions.create();
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let sessions = SessionStore::new();
        let a = sessions.create();
        let b = sessions.create();
        assert_ne!(a, b);
        assert_eq!(sessions.len(), 2);
    }
}
