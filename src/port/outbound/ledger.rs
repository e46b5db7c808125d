//! Internal balance ledger port.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::UserId;
use crate::error::Result;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current ledger balance of a user.
    async fn balance(&self, user: &UserId) -> Result<Decimal>;

    /// Overwrite the ledger balance of a user. Idempotent.
    async fn set_balance(&self, user: &UserId, balance: Decimal) -> Result<()>;
}
