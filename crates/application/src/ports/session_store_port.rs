//! Session store port - Per-call state behind exclusive access

use async_trait::async_trait;
use domain::{CallSession, CallSid, SessionLimits};
use tokio::sync::OwnedMutexGuard;

/// Exclusive handle on one call's session
///
/// Holding the guard serializes all webhook deliveries for the same call.
pub type SessionGuard = OwnedMutexGuard<CallSession>;

/// Port for the in-process session map
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// Lock the session for `call_sid`, creating it on first contact
    ///
    /// Concurrent first contacts for one call observe the same session.
    async fn acquire(&self, call_sid: &CallSid, limits: SessionLimits) -> SessionGuard;

    /// Snapshot of one session, if present
    async fn get(&self, call_sid: &CallSid) -> Option<CallSession>;

    /// Snapshots of all live sessions
    async fn list(&self) -> Vec<CallSession>;

    /// Drop the session, returning whether it existed
    async fn remove(&self, call_sid: &CallSid) -> bool;

    /// Approximate number of live sessions
    fn len(&self) -> u64;
}
