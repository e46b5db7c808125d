//! Full administrator wiring, in memory and on a shared SQLite database.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use croupier::adapter::outbound::memory::MemoryStore;
use croupier::adapter::outbound::presence::LocalPresence;
use croupier::domain::{CloseReason, ProviderType, SessionSignal, SessionStatus};
use croupier::infrastructure::config::settings::Config;
use croupier::infrastructure::orchestration::{health_check, Administrator, Services};
use croupier::port::outbound::presence::PresenceChannel;
use croupier::testkit::config::config;
use croupier::testkit::domain::seed_player;
use croupier::testkit::notifier::RecordingNotifier;
use croupier::testkit::wallet::ScriptedWallet;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use tokio::sync::watch;

async fn eventually(what: &str, check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

fn shared_config(admin: &str, dir: &TempDir) -> Config {
    let mut cfg = config(admin);
    cfg.database = dir.path().join("shared.db").to_string_lossy().into_owned();
    cfg.presence.heartbeat_ms = 25;
    cfg.presence.ttl_ms = 2000;
    cfg
}

#[tokio::test]
async fn administrator_monitors_while_leading_and_leaves_on_shutdown() {
    let mut cfg = config("admin-1");
    cfg.monitor.tick_secs = 1;
    let store = Arc::new(MemoryStore::new());
    let presence = Arc::new(LocalPresence::new());
    let recorder = RecordingNotifier::new();
    let user = seed_player(&store, "u-1", &["root"], ProviderType::Evolution);

    let services = Services::wire(
        &cfg,
        store.clone(),
        Arc::new(ScriptedWallet::new(dec!(64))),
        presence.clone(),
        recorder.registry(),
    );
    let lifecycle = Arc::clone(&services.lifecycle);
    let mut leadership = services.election.leadership();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = cfg.server.clone();
    let running = tokio::spawn(async move { services.run(&server, shutdown_rx).await });

    tokio::time::timeout(Duration::from_secs(2), leadership.wait_for(|l| *l))
        .await
        .unwrap()
        .unwrap();

    let session = lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();
    store.record_bet(&user, Utc::now());
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.session(&session.id).unwrap().status != SessionStatus::Active {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("monitor never activated the session");

    let outcome = lifecycle
        .signal(SessionSignal {
            session_id: session.id.clone(),
            reason: CloseReason::NormalClose,
        })
        .await
        .unwrap();
    assert_eq!(outcome.status(), SessionStatus::Ended);

    shutdown_tx.send(true).unwrap();
    running.await.unwrap().unwrap();

    assert!(presence.members().is_empty());
    assert!(!*leadership.borrow());
}

#[tokio::test]
async fn administrators_sharing_a_database_elect_one_leader() {
    let dir = TempDir::new().unwrap();
    let first = Administrator::open(&shared_config("admin-1", &dir)).unwrap();
    let second = Administrator::open(&shared_config("admin-2", &dir)).unwrap();
    let first_election = Arc::clone(&first.services.election);
    let second_election = Arc::clone(&second.services.election);
    let (first_tx, first_rx) = watch::channel(false);
    let (second_tx, second_rx) = watch::channel(false);

    // The larger id comes online first and must step down once it sees admin-1.
    let second_run = tokio::spawn(second.run(second_rx));
    eventually("admin-2 to lead alone", || second_election.is_leader()).await;
    let first_run = tokio::spawn(first.run(first_rx));

    eventually("a single leader", || {
        first_election.is_leader() && !second_election.is_leader()
    })
    .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(first_election.is_leader());
    assert!(!second_election.is_leader());

    first_tx.send(true).unwrap();
    first_run.await.unwrap().unwrap();
    eventually("admin-2 to take over", || second_election.is_leader()).await;
    assert!(!first_election.is_leader());

    second_tx.send(true).unwrap();
    second_run.await.unwrap().unwrap();
}

#[test]
fn config_file_drives_health_report() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
admin_id = "admin-2"
database = "sessions.db"

[monitor]
tick_secs = 10

[wallet.endpoints]
evolution = "https://wallet.evolution.example/api"

[server]
bind = "127.0.0.1:9400"
"#
    )
    .unwrap();

    let cfg = Config::load(file.path()).unwrap();
    let report = health_check(&cfg);

    assert!(report.is_healthy());
    assert!(report.checks().iter().all(|c| c.is_healthy()));
}
