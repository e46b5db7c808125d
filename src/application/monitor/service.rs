//! Session monitor service.
//!
//! Runs only while this process holds leadership. On acquiring it, one pass
//! runs immediately and then one per tick; on losing it, the timer is dropped
//! and the service waits for leadership again. The machine never ends a
//! session, so a pass never starts a reconciliation.
//!
//! # Architecture
//!
//! ```text
//! LeaderElection --(watch<bool>)--> SessionMonitor
//!                                        |
//!                                        +-- interval timer (leader only)
//!                                        +-- SessionStore::list_by_status()
//!                                        +-- SessionMachine::step() per session
//!                                        |
//!                                        v
//!                                    PassReport
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::application::session::{SessionMachine, StepOutcome};
use crate::domain::SessionStatus;
use crate::error::Result;
use crate::port::outbound::store::SessionStore;

/// Counters for one monitor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Sessions read and evaluated.
    pub evaluated: usize,
    /// Writes that changed a session's status.
    pub transitioned: usize,
    /// Writes that kept the status (active refresh).
    pub refreshed: usize,
    /// Writes skipped because the status moved on underneath.
    pub conflicts: usize,
    /// Sessions whose evaluation failed; retried next pass.
    pub failed: usize,
}

/// Handle for stopping a running [`SessionMonitor`].
pub struct MonitorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the monitor to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct SessionMonitor {
    store: Arc<dyn SessionStore>,
    machine: SessionMachine,
    tick: Duration,
}

impl SessionMonitor {
    pub fn new(
        store: Arc<dyn SessionStore>,
        machine: SessionMachine,
        tick: Duration,
    ) -> Self {
        Self {
            store,
            machine,
            tick,
        }
    }

    /// Evaluate every live session once.
    ///
    /// Per-session failures are logged and counted; only a failure to list
    /// sessions fails the pass.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport> {
        let sessions = self.store.list_by_status(&SessionStatus::LIVE).await?;
        let mut report = PassReport::default();

        for session in &sessions {
            report.evaluated += 1;
            match self.machine.step(session, now).await {
                Ok(StepOutcome::Unchanged) => {}
                Ok(StepOutcome::Applied { from, to }) => {
                    if from == to {
                        report.refreshed += 1;
                    } else {
                        report.transitioned += 1;
                    }
                }
                Ok(StepOutcome::Conflict) => report.conflicts += 1,
                Err(e) => {
                    warn!(
                        session_id = %session.id,
                        status = %session.status,
                        error = %e,
                        "Session evaluation failed, retrying next pass"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.transitioned > 0 || report.failed > 0 {
            debug!(?report, "Monitor pass complete");
        } else {
            trace!(?report, "Monitor pass complete");
        }
        Ok(report)
    }

    /// Start the monitor loop.
    ///
    /// Returns a handle for shutdown and a channel receiving one report per
    /// completed pass. Reports are dropped if the receiver falls behind.
    pub fn start(
        self,
        mut leadership: watch::Receiver<bool>,
    ) -> (MonitorHandle, mpsc::Receiver<PassReport>) {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (report_tx, report_rx) = mpsc::channel::<PassReport>(64);
        let monitor = Arc::new(self);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Session monitor shutting down");
                        return;
                    }
                    acquired = await_leadership(&mut leadership) => {
                        if !acquired {
                            debug!("Leadership channel closed, stopping monitor");
                            return;
                        }
                    }
                }

                info!(tick_secs = monitor.tick.as_secs(), "Leadership acquired, monitoring sessions");
                let mut ticker = tokio::time::interval(monitor.tick);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Session monitor shutting down");
                            return;
                        }
                        changed = leadership.changed() => {
                            if changed.is_err() {
                                debug!("Leadership channel closed, stopping monitor");
                                return;
                            }
                            if !*leadership.borrow_and_update() {
                                info!("Leadership lost, monitor paused");
                                break;
                            }
                        }
                        _ = ticker.tick() => {
                            match monitor.run_pass(Utc::now()).await {
                                Ok(report) => {
                                    if report_tx.try_send(report).is_err() {
                                        trace!("Pass report dropped");
                                    }
                                }
                                Err(e) => warn!(error = %e, "Monitor pass failed"),
                            }
                        }
                    }
                }
            }
        });

        (MonitorHandle { shutdown_tx, task }, report_rx)
    }
}

async fn await_leadership(leadership: &mut watch::Receiver<bool>) -> bool {
    leadership.wait_for(|leader| *leader).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::application::session::MachineConfig;
    use crate::testkit::domain::session;
    use chrono::Duration as ChronoDuration;

    fn monitor(store: &Arc<MemoryStore>) -> SessionMonitor {
        let machine = SessionMachine::new(
            MachineConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        SessionMonitor::new(store.clone(), machine, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn pass_skips_terminal_and_counts_transitions() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let ready = session("u-1", SessionStatus::Ready, now - ChronoDuration::minutes(1));
        let mut idle = session("u-2", SessionStatus::Active, now - ChronoDuration::minutes(20));
        idle.last_bet_at = Some(now - ChronoDuration::minutes(5));
        let ended = session("u-3", SessionStatus::Ended, now - ChronoDuration::minutes(1));
        for s in [&ready, &idle, &ended] {
            store.insert_session(s.clone());
        }
        store.record_bet(&ready.user_id, now - ChronoDuration::seconds(4));

        let report = monitor(&store).run_pass(now).await.unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.transitioned, 2);
        assert_eq!(store.session(&ready.id).unwrap().status, SessionStatus::Active);
        assert_eq!(store.session(&idle.id).unwrap().status, SessionStatus::Paused);
        assert_eq!(store.session(&ended.id).unwrap().status, SessionStatus::Ended);
    }

    #[tokio::test]
    async fn write_failures_are_counted_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let a = session("u-1", SessionStatus::Ready, now - ChronoDuration::minutes(1));
        let b = session("u-2", SessionStatus::Ready, now - ChronoDuration::minutes(1));
        store.insert_session(a.clone());
        store.insert_session(b.clone());
        store.record_bet(&a.user_id, now - ChronoDuration::seconds(1));
        store.record_bet(&b.user_id, now - ChronoDuration::seconds(1));
        store.fail_session_writes(true);

        let report = monitor(&store).run_pass(now).await.unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(store.session(&a.id).unwrap().status, SessionStatus::Ready);

        store.fail_session_writes(false);
        let retry = monitor(&store).run_pass(now).await.unwrap();
        assert_eq!(retry.transitioned, 2);
    }

    #[tokio::test]
    async fn idle_ready_session_stays_ready() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let ready = session("u-1", SessionStatus::Ready, now - ChronoDuration::hours(2));
        store.insert_session(ready.clone());

        let report = monitor(&store).run_pass(now).await.unwrap();

        assert_eq!(report, PassReport { evaluated: 1, ..PassReport::default() });
        assert_eq!(store.session(&ready.id).unwrap().status, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn paused_session_resumes_on_recent_bet() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let mut paused = session("u-1", SessionStatus::Paused, now - ChronoDuration::minutes(30));
        paused.last_bet_at = Some(now - ChronoDuration::minutes(12));
        store.insert_session(paused.clone());
        let bet_at = now - ChronoDuration::seconds(10);
        store.record_bet(&paused.user_id, bet_at);

        let report = monitor(&store).run_pass(now).await.unwrap();

        assert_eq!(report.transitioned, 1);
        let stored = store.session(&paused.id).unwrap();
        assert_eq!(stored.status, SessionStatus::Active);
        assert_eq!(stored.last_bet_at, Some(bet_at));
    }

    #[tokio::test]
    async fn paused_session_without_bets_is_never_expired() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let mut paused = session("u-1", SessionStatus::Paused, now - ChronoDuration::days(7));
        paused.last_bet_at = Some(now - ChronoDuration::days(6));
        store.insert_session(paused.clone());
        let monitor = monitor(&store);

        for hours in [0, 1, 24, 24 * 30] {
            let report = monitor
                .run_pass(now + ChronoDuration::hours(hours))
                .await
                .unwrap();
            assert_eq!(report, PassReport { evaluated: 1, ..PassReport::default() });
        }
        assert_eq!(store.session(&paused.id).unwrap().status, SessionStatus::Paused);
    }
}
