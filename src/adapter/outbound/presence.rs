//! In-process presence hub.
//!
//! All [`LeaderElection`](crate::application::election::LeaderElection)
//! instances sharing one `LocalPresence` see the same membership snapshots,
//! so it only spans one process. Separate administrator processes use
//! [`SqlitePresence`](crate::adapter::outbound::sqlite::SqlitePresence)
//! instead; the election logic does not change.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::trace;

use crate::domain::{AdminId, PresenceToken};
use crate::error::Result;
use crate::port::outbound::presence::{Membership, PresenceChannel};

pub struct LocalPresence {
    state: watch::Sender<Membership>,
}

impl LocalPresence {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(Membership::new());
        Self { state }
    }
}

impl Default for LocalPresence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceChannel for LocalPresence {
    async fn join(&self, admin: &AdminId, token: PresenceToken) -> Result<()> {
        // The token is refreshed even when the id set is unchanged; only a
        // change of ids is broadcast.
        let changed = self
            .state
            .send_if_modified(|members| members.insert(admin.clone(), token));
        trace!(admin_id = %admin, changed, "Presence join");
        Ok(())
    }

    async fn leave(&self, admin: &AdminId) -> Result<()> {
        let changed = self.state.send_if_modified(|members| members.remove(admin));
        trace!(admin_id = %admin, changed, "Presence leave");
        Ok(())
    }

    fn members(&self) -> Membership {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Membership> {
        self.state.subscribe()
    }
}
