//! Monitor loop cadence and leadership gating.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use croupier::adapter::outbound::memory::MemoryStore;
use croupier::application::monitor::{PassReport, SessionMonitor};
use croupier::application::session::{MachineConfig, SessionMachine};
use croupier::domain::SessionStatus;
use croupier::testkit::domain::session;
use tokio::sync::{mpsc, watch};

const TICK: Duration = Duration::from_secs(30);

fn monitor(store: &Arc<MemoryStore>) -> SessionMonitor {
    let machine = SessionMachine::new(
        MachineConfig::default(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    SessionMonitor::new(store.clone(), machine, TICK)
}

async fn next_report(reports: &mut mpsc::Receiver<PassReport>) -> PassReport {
    tokio::time::timeout(TICK * 2, reports.recv())
        .await
        .expect("no pass ran")
        .expect("monitor stopped")
}

#[tokio::test(start_paused = true)]
async fn first_pass_runs_immediately_on_leadership() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let ready = session("u-1", SessionStatus::Ready, now - ChronoDuration::minutes(1));
    store.insert_session(ready.clone());
    store.record_bet(&ready.user_id, now - ChronoDuration::seconds(2));
    let (_leader_tx, leader_rx) = watch::channel(true);

    let started = tokio::time::Instant::now();
    let (handle, mut reports) = monitor(&store).start(leader_rx);
    let report = next_report(&mut reports).await;

    assert!(started.elapsed() < TICK);
    assert_eq!(report.transitioned, 1);
    assert_eq!(store.session(&ready.id).unwrap().status, SessionStatus::Active);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn passes_follow_the_tick() {
    let store = Arc::new(MemoryStore::new());
    let (_leader_tx, leader_rx) = watch::channel(true);
    let (handle, mut reports) = monitor(&store).start(leader_rx);

    next_report(&mut reports).await;
    let before = tokio::time::Instant::now();
    next_report(&mut reports).await;

    assert!(before.elapsed() >= TICK);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn follower_never_runs_a_pass() {
    let store = Arc::new(MemoryStore::new());
    let (_leader_tx, leader_rx) = watch::channel(false);
    let (handle, mut reports) = monitor(&store).start(leader_rx);

    tokio::time::sleep(TICK * 5).await;

    assert!(reports.try_recv().is_err());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn losing_leadership_stops_passes_until_regained() {
    let store = Arc::new(MemoryStore::new());
    let (leader_tx, leader_rx) = watch::channel(true);
    let (handle, mut reports) = monitor(&store).start(leader_rx);
    next_report(&mut reports).await;

    leader_tx.send(false).unwrap();
    tokio::time::sleep(TICK * 4).await;
    while reports.try_recv().is_ok() {}
    tokio::time::sleep(TICK * 4).await;
    assert!(reports.try_recv().is_err());

    leader_tx.send(true).unwrap();
    next_report(&mut reports).await;
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dropped_leadership_channel_stops_monitor() {
    let store = Arc::new(MemoryStore::new());
    let (leader_tx, leader_rx) = watch::channel(false);
    let (handle, _reports) = monitor(&store).start(leader_rx);

    drop(leader_tx);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(handle.is_finished());
}
