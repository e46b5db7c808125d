//! Persistence port for game sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{GameSession, SessionId, SessionStatus, SessionUpdate};
use crate::error::Result;

/// Storage operations for game sessions.
///
/// Sessions are never deleted; terminal rows stay for settlement and audit.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a newly launched session.
    async fn insert(&self, session: &GameSession) -> Result<()>;

    /// Get a session by ID.
    async fn get(&self, id: &SessionId) -> Result<Option<GameSession>>;

    /// List sessions whose status is one of `statuses`.
    async fn list_by_status(&self, statuses: &[SessionStatus]) -> Result<Vec<GameSession>>;

    /// Replace the stored session with `update.next` only if its status is
    /// still `update.expected`. Returns whether the write happened.
    async fn compare_and_set(&self, update: &SessionUpdate) -> Result<bool>;

    /// Move a live session to a terminal status regardless of which live
    /// status it is in. Never overwrites a terminal session. Returns whether
    /// the write happened.
    async fn mark_terminal(
        &self,
        id: &SessionId,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Mark `id` as reconciled. Returns `false` when it was already marked,
    /// so at most one reconciliation runs per session.
    async fn claim_reconciliation(&self, id: &SessionId, at: DateTime<Utc>) -> Result<bool>;
}
