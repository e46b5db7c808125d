//! Launch, close signals and reconciliation end to end on the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use croupier::adapter::outbound::memory::MemoryStore;
use croupier::application::reconcile::Reconciler;
use croupier::application::session::{CloseOutcome, MachineConfig, SessionLifecycle, SessionMachine};
use croupier::domain::{CloseReason, ProviderType, SessionSignal, SessionStatus};
use croupier::error::ExternalWalletError;
use croupier::port::outbound::notifier::Event;
use croupier::testkit::domain::seed_player;
use croupier::testkit::notifier::RecordingNotifier;
use croupier::testkit::wallet::ScriptedWallet;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Harness {
    store: Arc<MemoryStore>,
    wallet: Arc<ScriptedWallet>,
    recorder: RecordingNotifier,
    lifecycle: SessionLifecycle,
    machine: SessionMachine,
}

fn harness(wallet: ScriptedWallet) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let wallet = Arc::new(wallet);
    let recorder = RecordingNotifier::new();
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        store.clone(),
        wallet.clone(),
        store.clone(),
        recorder.registry(),
        16,
    ));
    let lifecycle = SessionLifecycle::new(store.clone(), reconciler, recorder.registry());
    let machine = SessionMachine::new(
        MachineConfig::default(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    Harness {
        store,
        wallet,
        recorder,
        lifecycle,
        machine,
    }
}

fn close(session: &croupier::domain::GameSession, reason: CloseReason) -> SessionSignal {
    SessionSignal {
        session_id: session.id.clone(),
        reason,
    }
}

async fn finish(outcome: CloseOutcome) -> SessionStatus {
    let status = outcome.status();
    if let CloseOutcome::Closed { reconciliation, .. } = outcome {
        reconciliation.await.unwrap();
    }
    status
}

#[tokio::test]
async fn play_then_close_reconciles_from_root_partner() {
    let h = harness(ScriptedWallet::new(dec!(250.75)));
    let user = seed_player(&h.store, "u-1", &["agent", "master", "root"], ProviderType::Evolution);
    h.store.set_ledger_balance(&user, dec!(100));

    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();
    assert_eq!(session.status, SessionStatus::Ready);
    assert!(session.ready_marked_at.is_some());

    h.store.record_bet(&user, Utc::now());
    let stored = h.store.session(&session.id).unwrap();
    h.machine.step(&stored, Utc::now() + Duration::seconds(1)).await.unwrap();
    let active = h.store.session(&session.id).unwrap();
    assert_eq!(active.status, SessionStatus::Active);
    assert_eq!(active.balance_before, Some(dec!(100)));

    let status = finish(h.lifecycle.signal(close(&session, CloseReason::NormalClose)).await.unwrap()).await;

    assert_eq!(status, SessionStatus::Ended);
    let ended = h.store.session(&session.id).unwrap();
    assert_eq!(ended.status, SessionStatus::Ended);
    assert!(ended.ended_at.is_some());
    assert_eq!(h.store.ledger_balance(&user), Some(dec!(250.75)));
    assert_eq!(
        h.wallet.requests(),
        vec![("op-root".to_string(), "ext-u-1".to_string())]
    );
    assert_eq!(h.recorder.reconciliations_completed(), 1);
    assert_eq!(h.recorder.restart_notices(), 0);
}

#[tokio::test]
async fn network_failure_force_ends_and_asks_for_restart() {
    let h = harness(ScriptedWallet::new(dec!(42)));
    let user = seed_player(&h.store, "u-1", &["root"], ProviderType::Evolution);
    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();

    let status = finish(
        h.lifecycle
            .signal(close(&session, CloseReason::NetworkFailure))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(status, SessionStatus::ForceEnded);
    assert_eq!(h.recorder.restart_notices(), 1);
    assert_eq!(h.store.ledger_balance(&user), Some(dec!(42)));
    assert!(h.recorder.events().iter().any(|e| matches!(
        e,
        Event::RestartRequired { session_id, .. } if *session_id == session.id
    )));
}

#[tokio::test]
async fn paused_session_ignores_close_and_is_not_reconciled() {
    let h = harness(ScriptedWallet::new(dec!(1)));
    let user = seed_player(&h.store, "u-1", &["root"], ProviderType::Evolution);
    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();
    h.store.insert_session(session.paused(Utc::now()));

    let outcome = h
        .lifecycle
        .signal(close(&session, CloseReason::NormalClose))
        .await
        .unwrap();

    assert!(matches!(outcome, CloseOutcome::Ignored { status: SessionStatus::Paused }));
    assert_eq!(h.store.session(&session.id).unwrap().status, SessionStatus::Paused);
    assert_eq!(h.wallet.call_count(), 0);
    assert_eq!(h.store.ledger_writes(), 0);
}

#[tokio::test]
async fn second_close_signal_is_ignored() {
    let h = harness(ScriptedWallet::new(dec!(5)));
    let user = seed_player(&h.store, "u-1", &["root"], ProviderType::Evolution);
    let session = h.lifecycle.launch(user, ProviderType::Evolution).await.unwrap();

    finish(h.lifecycle.signal(close(&session, CloseReason::NormalClose)).await.unwrap()).await;
    let again = h
        .lifecycle
        .signal(close(&session, CloseReason::NetworkFailure))
        .await
        .unwrap();

    assert!(matches!(again, CloseOutcome::Ignored { status: SessionStatus::Ended }));
    assert_eq!(h.wallet.call_count(), 1);
    assert_eq!(h.recorder.restart_notices(), 0);
}

#[tokio::test]
async fn wallet_failure_keeps_terminal_status_and_ledger() {
    let h = harness(ScriptedWallet::failing(ExternalWalletError::Status(502)));
    let user = seed_player(&h.store, "u-1", &["root"], ProviderType::Evolution);
    h.store.set_ledger_balance(&user, dec!(77));
    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();

    let status = finish(h.lifecycle.signal(close(&session, CloseReason::NormalClose)).await.unwrap()).await;

    assert_eq!(status, SessionStatus::Ended);
    assert_eq!(h.store.session(&session.id).unwrap().status, SessionStatus::Ended);
    assert_eq!(h.store.ledger_balance(&user), Some(dec!(77)));
    assert_eq!(h.recorder.reconciliations_failed(), 1);
}

#[tokio::test]
async fn missing_root_credential_fails_reconciliation_only() {
    let h = harness(ScriptedWallet::new(dec!(9)));
    // Credential exists for a different provider.
    let user = seed_player(&h.store, "u-1", &["agent", "root"], ProviderType::Pragmatic);
    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();

    let status = finish(h.lifecycle.signal(close(&session, CloseReason::NormalClose)).await.unwrap()).await;

    assert_eq!(status, SessionStatus::Ended);
    assert_eq!(h.wallet.call_count(), 0);
    assert_eq!(h.store.ledger_balance(&user), None);
    let reason = h.recorder.events().into_iter().find_map(|e| match e {
        Event::ReconciliationFailed(event) => event.reason,
        _ => None,
    });
    assert!(reason.unwrap().contains("has no evolution credential"));
}

#[tokio::test]
async fn zero_balance_is_written() {
    let h = harness(ScriptedWallet::new(Decimal::ZERO));
    let user = seed_player(&h.store, "u-1", &["root"], ProviderType::Evolution);
    h.store.set_ledger_balance(&user, dec!(30));
    let session = h.lifecycle.launch(user.clone(), ProviderType::Evolution).await.unwrap();

    finish(h.lifecycle.signal(close(&session, CloseReason::NormalClose)).await.unwrap()).await;

    assert_eq!(h.store.ledger_balance(&user), Some(Decimal::ZERO));
}
