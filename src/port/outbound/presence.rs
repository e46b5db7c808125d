//! Presence channel port: the set of currently connected administrators.
//!
//! Membership is ephemeral. Every member sees the same broadcast snapshots
//! (eventually), which is all leader election needs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{AdminId, PresenceToken};
use crate::error::Result;

/// Snapshot of connected administrators, keyed and ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    members: BTreeMap<AdminId, PresenceToken>,
}

impl Membership {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &AdminId> {
        self.members.keys()
    }

    #[must_use]
    pub fn contains(&self, admin: &AdminId) -> bool {
        self.members.contains_key(admin)
    }

    #[must_use]
    pub fn token_of(&self, admin: &AdminId) -> Option<&PresenceToken> {
        self.members.get(admin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add or refresh a member. Returns true if the id set changed; a
    /// reconnect that only swaps the token does not count as a change.
    pub fn insert(&mut self, admin: AdminId, token: PresenceToken) -> bool {
        self.members.insert(admin, token).is_none()
    }

    /// Remove a member. Returns true if it was present.
    pub fn remove(&mut self, admin: &AdminId) -> bool {
        self.members.remove(admin).is_some()
    }
}

impl FromIterator<(AdminId, PresenceToken)> for Membership {
    fn from_iter<T: IntoIterator<Item = (AdminId, PresenceToken)>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Broadcast channel of administrator presence.
#[async_trait]
pub trait PresenceChannel: Send + Sync {
    /// Register presence. Idempotent under reconnect.
    async fn join(&self, admin: &AdminId, token: PresenceToken) -> Result<()>;

    /// Deregister presence.
    async fn leave(&self, admin: &AdminId) -> Result<()>;

    /// Current snapshot.
    fn members(&self) -> Membership;

    /// Receiver of membership snapshots; changes between reads are merged.
    fn subscribe(&self) -> watch::Receiver<Membership>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_swap_is_not_a_membership_change() {
        let mut membership = Membership::new();
        assert!(membership.insert(AdminId::new("a"), PresenceToken::new("t1")));
        assert!(!membership.insert(AdminId::new("a"), PresenceToken::new("t2")));
        assert_eq!(membership.len(), 1);
        assert_eq!(
            membership.token_of(&AdminId::new("a")),
            Some(&PresenceToken::new("t2"))
        );
    }

    #[test]
    fn ids_iterate_in_ascending_order() {
        let membership: Membership = ["c", "a", "b"]
            .into_iter()
            .map(|id| (AdminId::new(id), PresenceToken::generate()))
            .collect();
        let ids: Vec<_> = membership.ids().map(AdminId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
