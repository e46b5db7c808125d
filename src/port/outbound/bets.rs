//! Read-only port over the bet-record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::UserId;
use crate::error::Result;

/// Bet activity queries.
#[async_trait]
pub trait BetActivityReader: Send + Sync {
    /// Timestamp of the user's newest bet placed strictly after `after`.
    async fn latest_bet_after(
        &self,
        user: &UserId,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>>;

    /// Whether the user placed any bet strictly after `since`.
    async fn has_bet_since(&self, user: &UserId, since: DateTime<Utc>) -> Result<bool> {
        Ok(self.latest_bet_after(user, since).await?.is_some())
    }
}
