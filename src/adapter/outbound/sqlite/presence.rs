//! Presence shared through the SQLite database.
//!
//! Every administrator pointed at the same database file sees the same
//! members. A joined administrator owns one `presence` row and refreshes its
//! `heartbeat_at` on every poll. A row older than the TTL counts as gone and
//! is pruned by whichever process polls next, so a crashed administrator
//! drops out without calling `leave`.
//!
//! Changes made by other processes become visible on the next poll. Host
//! clocks must agree to well within the TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use super::database::connection::DbPool;
use super::database::model::PresenceRow;
use super::database::schema::presence;
use super::store::format_ts;
use crate::domain::{AdminId, PresenceToken};
use crate::error::{Error, Result};
use crate::port::outbound::presence::{Membership, PresenceChannel};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Handle for stopping the heartbeat started by [`SqlitePresence::start`].
pub struct PresenceHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PresenceHandle {
    /// Stop heartbeating and wait for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

pub struct SqlitePresence {
    pool: DbPool,
    ttl: chrono::Duration,
    /// Members registered through this instance; heartbeated on every poll.
    joined: Mutex<HashMap<AdminId, PresenceToken>>,
    state: watch::Sender<Membership>,
}

impl SqlitePresence {
    #[must_use]
    pub fn new(pool: DbPool, ttl: chrono::Duration) -> Self {
        let (state, _) = watch::channel(Membership::new());
        Self {
            pool,
            ttl,
            joined: Mutex::new(HashMap::new()),
            state,
        }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }

    /// Heartbeat local members, prune expired rows and publish the live set.
    /// Returns whether the set of ids changed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub fn poll(&self) -> Result<bool> {
        let joined = self.joined.lock();
        let mut conn = self.conn()?;
        let now = Utc::now();

        let heartbeat_at = format_ts(now);
        for (admin, token) in joined.iter() {
            let row = PresenceRow {
                admin_id: admin.to_string(),
                token: token.to_string(),
                heartbeat_at: heartbeat_at.clone(),
            };
            diesel::insert_into(presence::table)
                .values(&row)
                .on_conflict(presence::admin_id)
                .do_update()
                .set(&row)
                .execute(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?;
        }

        let cutoff = format_ts(now - self.ttl);
        let pruned = diesel::delete(presence::table.filter(presence::heartbeat_at.lt(cutoff)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        if pruned > 0 {
            debug!(pruned, "Expired presence rows removed");
        }

        let rows: Vec<PresenceRow> = presence::table
            .select(PresenceRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(joined);

        let members: Membership = rows
            .into_iter()
            .map(|row| (AdminId::from(row.admin_id), PresenceToken::from(row.token)))
            .collect();
        Ok(self.publish(members))
    }

    /// Replace the snapshot; only a change of ids wakes subscribers.
    fn publish(&self, members: Membership) -> bool {
        self.state.send_if_modified(|current| {
            let changed = !current.ids().eq(members.ids());
            *current = members;
            changed
        })
    }

    /// Poll every `interval` until the handle is shut down.
    pub fn start(self: &Arc<Self>, interval: Duration) -> PresenceHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let presence = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Presence heartbeat shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match presence.poll() {
                            Ok(true) => debug!(
                                members = presence.members().len(),
                                "Presence membership changed"
                            ),
                            Ok(false) => {}
                            Err(e) => warn!(error = %e, "Presence heartbeat failed"),
                        }
                    }
                }
            }
        });

        PresenceHandle { shutdown_tx, task }
    }
}

#[async_trait]
impl PresenceChannel for SqlitePresence {
    async fn join(&self, admin: &AdminId, token: PresenceToken) -> Result<()> {
        self.joined.lock().insert(admin.clone(), token);
        let changed = self.poll()?;
        trace!(admin_id = %admin, changed, "Presence join");
        Ok(())
    }

    async fn leave(&self, admin: &AdminId) -> Result<()> {
        {
            let mut joined = self.joined.lock();
            joined.remove(admin);
            let mut conn = self.conn()?;
            diesel::delete(presence::table.find(admin.as_str()))
                .execute(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?;
        }
        let changed = self.poll()?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::open;
    use tempfile::TempDir;

    fn shared(dir: &TempDir, ttl_ms: i64) -> (Arc<SqlitePresence>, Arc<SqlitePresence>) {
        let url = dir.path().join("presence.db").to_string_lossy().into_owned();
        let ttl = chrono::Duration::milliseconds(ttl_ms);
        (
            Arc::new(SqlitePresence::new(open(&url).unwrap(), ttl)),
            Arc::new(SqlitePresence::new(open(&url).unwrap(), ttl)),
        )
    }

    #[tokio::test]
    async fn members_are_visible_across_pools() {
        let dir = TempDir::new().unwrap();
        let (first, second) = shared(&dir, 60_000);

        first.join(&AdminId::new("b"), PresenceToken::generate()).await.unwrap();
        second.join(&AdminId::new("a"), PresenceToken::generate()).await.unwrap();
        assert!(first.poll().unwrap());

        let members = first.members();
        let ids: Vec<_> = members.ids().map(AdminId::as_str).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(second.members().len(), 2);
    }

    #[tokio::test]
    async fn leave_is_seen_by_other_pool() {
        let dir = TempDir::new().unwrap();
        let (first, second) = shared(&dir, 60_000);
        first.join(&AdminId::new("a"), PresenceToken::generate()).await.unwrap();
        second.join(&AdminId::new("b"), PresenceToken::generate()).await.unwrap();
        let mut rx = second.subscribe();
        rx.borrow_and_update();

        first.leave(&AdminId::new("a")).await.unwrap();
        assert!(second.poll().unwrap());

        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().contains(&AdminId::new("a")));
        assert!(!first.members().contains(&AdminId::new("a")));
    }

    #[tokio::test]
    async fn silent_member_expires_after_ttl() {
        let dir = TempDir::new().unwrap();
        let (crashed, survivor) = shared(&dir, 150);
        crashed.join(&AdminId::new("a"), PresenceToken::generate()).await.unwrap();
        survivor.join(&AdminId::new("b"), PresenceToken::generate()).await.unwrap();
        assert_eq!(survivor.members().len(), 2);

        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        survivor.poll().unwrap();

        let members = survivor.members();
        let ids: Vec<_> = members.ids().map(AdminId::as_str).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn heartbeat_keeps_member_alive_until_stopped() {
        let dir = TempDir::new().unwrap();
        let (first, observer) = shared(&dir, 150);
        first.join(&AdminId::new("a"), PresenceToken::generate()).await.unwrap();
        let heartbeat = first.start(std::time::Duration::from_millis(20));

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        observer.poll().unwrap();
        assert!(observer.members().contains(&AdminId::new("a")));

        heartbeat.shutdown().await;
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        observer.poll().unwrap();
        assert!(observer.members().is_empty());
    }

    #[tokio::test]
    async fn token_refresh_is_not_a_membership_change() {
        let dir = TempDir::new().unwrap();
        let (first, _) = shared(&dir, 60_000);
        let admin = AdminId::new("a");
        first.join(&admin, PresenceToken::new("t1")).await.unwrap();
        let mut rx = first.subscribe();
        rx.borrow_and_update();

        first.join(&admin, PresenceToken::new("t2")).await.unwrap();

        assert!(!rx.has_changed().unwrap());
        assert_eq!(
            first.members().token_of(&admin),
            Some(&PresenceToken::new("t2"))
        );
    }
}
