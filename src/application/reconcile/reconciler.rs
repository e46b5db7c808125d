//! Balance reconciliation after a session closes.
//!
//! Runs at most once per closed session: claim the session in the store,
//! resolve the root credential, ask the provider wallet for the player's
//! balance and overwrite the ledger. A failure after the claim is not retried
//! automatically; it surfaces as an operator notification. The
//! session's terminal status is never touched here, so a failed
//! reconciliation leaves a closed session with a possibly stale ledger and an
//! operator notification.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::resolver::CredentialResolver;
use crate::domain::{GameSession, ProviderType, SessionId, SessionStatus, UserId};
use crate::error::{CredentialResolutionError, Result};
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::notifier::{Event, NotifierRegistry, ReconciliationEvent};
use crate::port::outbound::partner::PartnerDirectory;
use crate::port::outbound::store::SessionStore;
use crate::port::outbound::wallet::{validate_balance, WalletClient};

/// One reconciliation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub provider: ProviderType,
    /// Status the session had just before the terminal write.
    pub prior_status: SessionStatus,
}

impl ReconcileRequest {
    #[must_use]
    pub fn for_session(session: &GameSession, prior_status: SessionStatus) -> Self {
        Self {
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
            provider: session.provider,
            prior_status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Ledger overwritten with the provider balance.
    Reconciled { balance: Decimal },
    /// The session was not `ready`/`active` before closing.
    Skipped { prior_status: SessionStatus },
    /// Another call already claimed this session.
    AlreadyReconciled,
}

pub struct Reconciler {
    sessions: Arc<dyn SessionStore>,
    directory: Arc<dyn PartnerDirectory>,
    resolver: CredentialResolver,
    wallet: Arc<dyn WalletClient>,
    ledger: Arc<dyn Ledger>,
    notifiers: Arc<NotifierRegistry>,
}

impl Reconciler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn PartnerDirectory>,
        wallet: Arc<dyn WalletClient>,
        ledger: Arc<dyn Ledger>,
        notifiers: Arc<NotifierRegistry>,
        max_hops: usize,
    ) -> Self {
        Self {
            resolver: CredentialResolver::new(Arc::clone(&directory), max_hops),
            sessions,
            directory,
            wallet,
            ledger,
            notifiers,
        }
    }

    /// Run one reconciliation inline.
    ///
    /// # Errors
    /// Credential resolution and wallet failures are returned as-is; the
    /// ledger is left untouched in both cases.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome> {
        if !request.prior_status.accepts_close() {
            return Ok(ReconcileOutcome::Skipped {
                prior_status: request.prior_status,
            });
        }
        if !self
            .sessions
            .claim_reconciliation(&request.session_id, Utc::now())
            .await?
        {
            return Ok(ReconcileOutcome::AlreadyReconciled);
        }

        let account = self
            .directory
            .account(&request.user_id)
            .await?
            .ok_or_else(|| CredentialResolutionError::UnknownUser(request.user_id.clone()))?;
        let credential = self.resolver.resolve(&account, request.provider).await?;

        let balance = self
            .wallet
            .balance(&credential, &account.external_username)
            .await
            .and_then(validate_balance)?;

        self.ledger.set_balance(&request.user_id, balance).await?;
        Ok(ReconcileOutcome::Reconciled { balance })
    }

    /// Run reconciliation as an independent task.
    ///
    /// Failures are logged and broadcast as
    /// [`Event::ReconciliationFailed`]; they never reach the caller.
    pub fn dispatch(self: &Arc<Self>, request: ReconcileRequest) -> JoinHandle<()> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            match reconciler.reconcile(&request).await {
                Ok(ReconcileOutcome::Reconciled { balance }) => {
                    info!(
                        session_id = %request.session_id,
                        user_id = %request.user_id,
                        provider = %request.provider,
                        %balance,
                        "Reconciliation completed"
                    );
                    reconciler
                        .notifiers
                        .notify_all(Event::ReconciliationCompleted(ReconciliationEvent {
                            session_id: request.session_id,
                            user_id: request.user_id,
                            provider: request.provider,
                            balance: Some(balance),
                            reason: None,
                        }));
                }
                Ok(ReconcileOutcome::Skipped { prior_status }) => {
                    debug!(
                        session_id = %request.session_id,
                        prior_status = %prior_status,
                        "Reconciliation skipped"
                    );
                }
                Ok(ReconcileOutcome::AlreadyReconciled) => {
                    debug!(
                        session_id = %request.session_id,
                        "Session already reconciled"
                    );
                }
                Err(e) => {
                    error!(
                        session_id = %request.session_id,
                        user_id = %request.user_id,
                        provider = %request.provider,
                        error = %e,
                        "Reconciliation failed"
                    );
                    reconciler
                        .notifiers
                        .notify_all(Event::ReconciliationFailed(ReconciliationEvent {
                            session_id: request.session_id,
                            user_id: request.user_id,
                            provider: request.provider,
                            balance: None,
                            reason: Some(e.to_string()),
                        }));
                }
            }
        })
    }
}
