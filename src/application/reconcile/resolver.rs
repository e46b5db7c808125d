//! Root credential lookup.
//!
//! Provider credentials are held by root partners only. A player's referring
//! partner may sit several levels deep, so the chain is followed upward until
//! a partner without a parent is found. The walk is bounded to guard against
//! cycles in the hierarchy.

use std::sync::Arc;

use tracing::trace;

use crate::domain::{PartnerId, ProviderCredential, ProviderType, UserAccount};
use crate::error::{CredentialResolutionError, Result};
use crate::port::outbound::partner::PartnerDirectory;

/// Default bound on parent links followed from the referring partner.
pub const DEFAULT_MAX_HOPS: usize = 16;

pub struct CredentialResolver {
    directory: Arc<dyn PartnerDirectory>,
    max_hops: usize,
}

impl CredentialResolver {
    pub fn new(directory: Arc<dyn PartnerDirectory>, max_hops: usize) -> Self {
        Self {
            directory,
            max_hops,
        }
    }

    /// Follow parent links from `start` to the root partner.
    ///
    /// # Errors
    /// [`CredentialResolutionError::HopLimitExceeded`] after more than
    /// `max_hops` links; directory failures propagate.
    pub async fn root_of(&self, start: &PartnerId) -> Result<PartnerId> {
        let mut current = start.clone();
        let mut hops = 0usize;
        while let Some(parent) = self.directory.parent_of(&current).await? {
            hops += 1;
            if hops > self.max_hops {
                return Err(CredentialResolutionError::HopLimitExceeded {
                    start: start.clone(),
                    max_hops: self.max_hops,
                }
                .into());
            }
            trace!(partner = %current, parent = %parent, hops, "Following parent link");
            current = parent;
        }
        Ok(current)
    }

    /// Credential of the root partner above `account`'s referrer.
    pub async fn resolve(
        &self,
        account: &UserAccount,
        provider: ProviderType,
    ) -> Result<ProviderCredential> {
        let referrer = account
            .referrer
            .as_ref()
            .ok_or_else(|| CredentialResolutionError::NoReferrer(account.user_id.clone()))?;
        let root = self.root_of(referrer).await?;
        self.directory
            .credential(&root, provider)
            .await?
            .ok_or_else(|| CredentialResolutionError::MissingCredential { root, provider }.into())
    }
}
