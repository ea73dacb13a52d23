//! Moka-backed call session store
//!
//! One entry per live call. `get_with` creates the session exactly once even
//! when the first webhooks for a call arrive concurrently, and the per-call
//! mutex serializes every later callback for that call.

use std::{fmt, sync::Arc, time::Duration};

use application::ports::{SessionGuard, SessionStorePort};
use async_trait::async_trait;
use domain::{CallSession, CallSid, SessionLimits};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::ConversationConfig;

type SharedSession = Arc<Mutex<CallSession>>;

/// In-process session store with idle expiry and a capacity bound
pub struct MokaSessionStore {
    cache: Cache<CallSid, SharedSession>,
}

impl fmt::Debug for MokaSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaSessionStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaSessionStore {
    /// Sessions are dropped after `idle_timeout` without a callback
    pub fn new(idle_timeout: Duration, max_sessions: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .build();
        Self { cache }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.session_idle_timeout(), config.max_sessions)
    }
}

#[async_trait]
impl SessionStorePort for MokaSessionStore {
    #[instrument(skip(self, call_sid, limits), fields(call_sid = %call_sid))]
    async fn acquire(&self, call_sid: &CallSid, limits: SessionLimits) -> SessionGuard {
        let session = self
            .cache
            .get_with_by_ref(call_sid, async {
                debug!("Creating call session");
                Arc::new(Mutex::new(CallSession::new(call_sid.clone(), limits)))
            })
            .await;
        session.lock_owned().await
    }

    async fn get(&self, call_sid: &CallSid) -> Option<CallSession> {
        let session = self.cache.get(call_sid).await?;
        let snapshot = session.lock().await.clone();
        Some(snapshot)
    }

    async fn list(&self) -> Vec<CallSession> {
        let entries: Vec<SharedSession> = self.cache.iter().map(|(_, session)| session).collect();

        let mut sessions = Vec::with_capacity(entries.len());
        for session in entries {
            sessions.push(session.lock().await.clone());
        }
        sessions.sort_by_key(CallSession::created_at);
        sessions
    }

    #[instrument(skip(self, call_sid), fields(call_sid = %call_sid))]
    async fn remove(&self, call_sid: &CallSid) -> bool {
        let removed = self.cache.remove(call_sid).await.is_some();
        if removed {
            debug!("Removed call session");
        }
        removed
    }

    fn len(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use domain::{NextAction, TurnState};

    use super::*;

    fn sid(value: &str) -> CallSid {
        CallSid::new(value).unwrap()
    }

    fn store() -> MokaSessionStore {
        MokaSessionStore::new(Duration::from_secs(900), 100)
    }

    #[tokio::test]
    async fn acquire_creates_session_once() {
        let store = store();
        let call = sid("CA123");

        {
            let mut session = store.acquire(&call, SessionLimits::default()).await;
            assert_eq!(session.state(), TurnState::Start);
            session.transition(TurnState::AwaitingSpeech).unwrap();
        }

        let session = store.acquire(&call, SessionLimits::default()).await;
        assert_eq!(session.state(), TurnState::AwaitingSpeech);
    }

    #[tokio::test]
    async fn limits_apply_to_new_sessions() {
        let store = store();
        let limits = SessionLimits {
            max_turns: 5,
            max_transcript_entries: 4,
        };
        let session = store.acquire(&sid("CA1"), limits).await;
        assert_eq!(session.max_turns(), 5);
        assert_eq!(session.transcript().capacity(), 4);
    }

    #[tokio::test]
    async fn get_returns_snapshot() {
        let store = store();
        let call = sid("CA9");
        assert!(store.get(&call).await.is_none());

        {
            let mut session = store.acquire(&call, SessionLimits::default()).await;
            session.emit(NextAction::Prompt {
                text: "Hello".to_string(),
            });
        }

        let snapshot = store.get(&call).await.unwrap();
        assert_eq!(snapshot.exchanges(), 1);
        assert_eq!(snapshot.call_sid(), &call);
    }

    #[tokio::test]
    async fn concurrent_first_contacts_share_one_session() {
        let store = Arc::new(store());
        let call = sid("CA-race");

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let call = call.clone();
                tokio::spawn(async move {
                    let mut session = store.acquire(&call, SessionLimits::default()).await;
                    session.emit(NextAction::Prompt {
                        text: "Hi".to_string(),
                    })
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = store.get(&call).await.unwrap();
        assert_eq!(snapshot.exchanges(), 16);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn guard_serializes_access() {
        let store = Arc::new(store());
        let call = sid("CA-lock");
        let guard = store.acquire(&call, SessionLimits::default()).await;

        let contender = {
            let store = store.clone();
            let call = call.clone();
            tokio::spawn(async move {
                let session = store.acquire(&call, SessionLimits::default()).await;
                session.exchanges()
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        let mut guard = guard;
        guard.emit(NextAction::Prompt {
            text: "first".to_string(),
        });
        drop(guard);

        assert_eq!(contender.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_and_remove() {
        let store = store();
        for id in ["CA1", "CA2", "CA3"] {
            drop(store.acquire(&sid(id), SessionLimits::default()).await);
        }

        assert_eq!(store.list().await.len(), 3);
        assert!(store.remove(&sid("CA2")).await);
        assert!(!store.remove(&sid("CA2")).await);

        let remaining: Vec<String> = store
            .list()
            .await
            .iter()
            .map(|s| s.call_sid().to_string())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&"CA2".to_string()));
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let store = MokaSessionStore::new(Duration::from_millis(50), 100);
        let call = sid("CA-idle");
        drop(store.acquire(&call, SessionLimits::default()).await);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.get(&call).await.is_none());

        let fresh = store.acquire(&call, SessionLimits::default()).await;
        assert_eq!(fresh.exchanges(), 0);
    }
}
