//! Leadership state of one administrator process.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{AdminId, PresenceToken};
use crate::error::Result;
use crate::port::outbound::notifier::{Event, NotifierRegistry};
use crate::port::outbound::presence::{Membership, PresenceChannel};

/// Whether `admin` leads the given member set.
///
/// Ids are compared lexicographically and the smallest one leads. An empty
/// set has no leader, and an id outside the set never leads.
pub fn is_leader<'a>(admin: &AdminId, members: impl IntoIterator<Item = &'a AdminId>) -> bool {
    let mut ids: Vec<&AdminId> = members.into_iter().collect();
    ids.sort();
    ids.first().is_some_and(|first| *first == admin)
}

/// Handle for stopping the membership watcher started by
/// [`LeaderElection::start`].
pub struct ElectionHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ElectionHandle {
    /// Stop watching membership and wait for the watcher to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// One administrator's view of the election.
///
/// Publishes leadership as a `watch` boolean that the session monitor
/// follows. Performs no store writes.
pub struct LeaderElection {
    admin: AdminId,
    token: PresenceToken,
    presence: Arc<dyn PresenceChannel>,
    leadership: watch::Sender<bool>,
    notifiers: Arc<NotifierRegistry>,
}

impl LeaderElection {
    pub fn new(
        admin: AdminId,
        presence: Arc<dyn PresenceChannel>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        let (leadership, _) = watch::channel(false);
        Self {
            admin,
            token: PresenceToken::generate(),
            presence,
            leadership,
            notifiers,
        }
    }

    #[must_use]
    pub fn admin_id(&self) -> &AdminId {
        &self.admin
    }

    /// Register this administrator's presence.
    ///
    /// Safe to call again after a reconnect: the same id and token are
    /// re-registered and the leader is recomputed.
    pub async fn join(&self) -> Result<()> {
        self.presence.join(&self.admin, self.token.clone()).await?;
        debug!(admin_id = %self.admin, "Joined presence channel");
        self.reelect(&self.presence.members());
        Ok(())
    }

    /// Deregister this administrator. Leadership is dropped immediately; the
    /// remaining members re-elect on their next membership callback.
    pub async fn leave(&self) -> Result<()> {
        self.presence.leave(&self.admin).await?;
        debug!(admin_id = %self.admin, "Left presence channel");
        self.set_leader(false);
        Ok(())
    }

    /// Current leadership as last computed.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        *self.leadership.borrow()
    }

    /// Receiver that observes leadership changes.
    #[must_use]
    pub fn leadership(&self) -> watch::Receiver<bool> {
        self.leadership.subscribe()
    }

    /// Run `callback` with the latest member set after it changes.
    ///
    /// Changes that land before the callback task runs are merged: the
    /// callback sees the newest snapshot once, not every intermediate one.
    /// The task ends when the presence channel is dropped.
    pub fn on_membership_changed<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(&Membership) + Send + 'static,
    {
        let mut members_rx = self.presence.subscribe();
        tokio::spawn(async move {
            while members_rx.changed().await.is_ok() {
                let snapshot = members_rx.borrow_and_update().clone();
                callback(&snapshot);
            }
        })
    }

    /// Recompute leadership now and on every membership change.
    pub fn start(self: &Arc<Self>) -> ElectionHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut members_rx = self.presence.subscribe();
        let election = Arc::clone(self);

        let task = tokio::spawn(async move {
            let initial = members_rx.borrow_and_update().clone();
            election.reelect(&initial);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(admin_id = %election.admin, "Election watcher shutting down");
                        break;
                    }
                    changed = members_rx.changed() => {
                        if changed.is_err() {
                            debug!("Presence channel closed");
                            break;
                        }
                        let snapshot = members_rx.borrow_and_update().clone();
                        election.reelect(&snapshot);
                    }
                }
            }
        });

        ElectionHandle { shutdown_tx, task }
    }

    /// Apply the election rule to a membership snapshot. Returns the new
    /// leadership flag.
    fn reelect(&self, members: &Membership) -> bool {
        let leader = members.contains(&self.admin) && is_leader(&self.admin, members.ids());
        debug!(
            admin_id = %self.admin,
            members = members.len(),
            leader,
            "Membership evaluated"
        );
        self.set_leader(leader);
        leader
    }

    fn set_leader(&self, leader: bool) {
        let changed = self.leadership.send_if_modified(|current| {
            if *current == leader {
                return false;
            }
            *current = leader;
            true
        });
        if changed {
            info!(admin_id = %self.admin, is_leader = leader, "Leadership changed");
            self.notifiers.notify_all(Event::LeadershipChanged {
                admin_id: self.admin.clone(),
                is_leader: leader,
            });
        }
    }
}
