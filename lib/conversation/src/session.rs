//! Conversation session management.
//!
//! A session remembers what the bot learned about a conversation across
//! messages. Today that is only the place name of the last shared location.
//! Sessions are created lazily and live in memory; idle ones are evicted by
//! [`SessionStore::evict_idle`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fishbot_core::ConversationId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Per-conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: ConversationId,
    /// Reverse-geocoded name of the last shared location.
    pub location_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            id,
            location_name: None,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Records the resolved location name.
    pub fn set_location(&mut self, name: impl Into<String>) {
        self.location_name = Some(name.into());
        self.last_active_at = Utc::now();
    }

    /// Marks the session as active now.
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Returns true if the session has seen no activity since `cutoff`.
    #[must_use]
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_active_at < cutoff
    }
}

/// Shared, lockable session.
///
/// Holding the lock serializes the messages of one conversation.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Trait for session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for `id`, creating an empty one if needed.
    async fn get_or_create(&self, id: &ConversationId) -> SessionHandle;

    /// Records a resolved location name for `id`.
    async fn set_location(&self, id: &ConversationId, name: String);

    /// Number of live sessions.
    async fn len(&self) -> usize;

    /// Removes sessions idle since `cutoff`, returning how many were removed.
    ///
    /// Sessions still referenced outside the store (a message holds the
    /// handle, locked or not) are kept.
    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ConversationId, SessionHandle>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &ConversationId) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(id.clone()).or_insert_with(|| {
            debug!(conversation = %id, "creating session");
            Arc::new(Mutex::new(Session::new(id.clone())))
        });
        Arc::clone(handle)
    }

    async fn set_location(&self, id: &ConversationId, name: String) {
        let handle = self.get_or_create(id).await;
        handle.lock().await.set_location(name);
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => !session.is_idle_since(cutoff),
                Err(_) => true,
            }
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = InMemorySessionStore::new();
        let id = ConversationId::new("psid-1");

        let first = store.get_or_create(&id).await;
        let second = store.get_or_create(&id).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
        assert_eq!(first.lock().await.location_name, None);
    }

    #[tokio::test]
    async fn set_location_creates_and_updates() {
        let store = InMemorySessionStore::new();
        let id = ConversationId::new("psid-2");

        store.set_location(&id, "Puli".to_string()).await;
        store.set_location(&id, "Hualien".to_string()).await;

        let session = store.get_or_create(&id).await;
        assert_eq!(session.lock().await.location_name.as_deref(), Some("Hualien"));
    }

    #[tokio::test]
    async fn evict_idle_removes_only_stale_sessions() {
        let store = InMemorySessionStore::new();
        let stale = store.get_or_create(&ConversationId::new("stale")).await;
        stale.lock().await.last_active_at = Utc::now() - Duration::hours(2);
        drop(stale);
        let _fresh = store.get_or_create(&ConversationId::new("fresh")).await;

        let removed = store.evict_idle(Utc::now() - Duration::hours(1)).await;

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn evict_idle_keeps_locked_sessions() {
        let store = InMemorySessionStore::new();
        let busy = store.get_or_create(&ConversationId::new("busy")).await;
        let mut guard = busy.lock().await;
        guard.last_active_at = Utc::now() - Duration::hours(2);

        let removed = store.evict_idle(Utc::now()).await;

        assert_eq!(removed, 0);
        drop(guard);
        drop(busy);
        assert_eq!(store.evict_idle(Utc::now()).await, 1);
    }

    #[tokio::test]
    async fn evict_idle_keeps_handed_out_sessions() {
        let store = InMemorySessionStore::new();
        let id = ConversationId::new("pending");
        let pending = store.get_or_create(&id).await;
        pending.lock().await.last_active_at = Utc::now() - Duration::hours(2);

        assert_eq!(store.evict_idle(Utc::now()).await, 0);
        let again = store.get_or_create(&id).await;
        assert!(Arc::ptr_eq(&pending, &again));

        drop(pending);
        drop(again);
        assert_eq!(store.evict_idle(Utc::now()).await, 1);
    }

    #[test]
    fn touch_refreshes_activity() {
        let mut session = Session::new(ConversationId::new("x"));
        session.last_active_at = Utc::now() - Duration::minutes(30);
        session.touch();
        assert!(!session.is_idle_since(Utc::now() - Duration::minutes(1)));
    }
}
