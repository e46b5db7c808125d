//! Read port over player accounts, the partner hierarchy and provider
//! credentials held by root partners.

use async_trait::async_trait;

use crate::domain::{PartnerId, ProviderCredential, ProviderType, UserAccount, UserId};
use crate::error::Result;

#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    /// Player record, if the user exists.
    async fn account(&self, user: &UserId) -> Result<Option<UserAccount>>;

    /// Parent of a partner; `None` means the partner is a root.
    async fn parent_of(&self, partner: &PartnerId) -> Result<Option<PartnerId>>;

    /// Credential the root partner holds for `provider`.
    async fn credential(
        &self,
        root: &PartnerId,
        provider: ProviderType,
    ) -> Result<Option<ProviderCredential>>;
}
