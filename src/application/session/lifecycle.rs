//! Launches and client close signals.
//!
//! Signals are authoritative: they are applied by whichever process receives
//! them, leader or not, and override a concurrent monitor transition to
//! `paused`. They never overwrite a terminal status.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::reconcile::{ReconcileRequest, Reconciler};
use crate::domain::{CloseReason, GameSession, ProviderType, SessionSignal, SessionStatus, UserId};
use crate::error::{Result, SessionError};
use crate::port::outbound::notifier::{Event, NotifierRegistry};
use crate::port::outbound::store::SessionStore;

/// Result of handling a close signal.
#[derive(Debug)]
pub enum CloseOutcome {
    /// Terminal status written; reconciliation runs in `reconciliation`.
    Closed {
        status: SessionStatus,
        reconciliation: JoinHandle<()>,
    },
    /// The session's status does not accept close signals.
    Ignored { status: SessionStatus },
}

impl CloseOutcome {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Closed { status, .. } | Self::Ignored { status } => *status,
        }
    }
}

pub struct SessionLifecycle {
    store: Arc<dyn SessionStore>,
    reconciler: Arc<Reconciler>,
    notifiers: Arc<NotifierRegistry>,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<dyn SessionStore>,
        reconciler: Arc<Reconciler>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        Self {
            store,
            reconciler,
            notifiers,
        }
    }

    /// Create a `ready` session for a new game launch.
    pub async fn launch(&self, user_id: UserId, provider: ProviderType) -> Result<GameSession> {
        let session = GameSession::launch(user_id, provider, Utc::now());
        self.store.insert(&session).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            provider = %session.provider,
            "Session launched"
        );
        Ok(session)
    }

    /// Apply a close or network-failure signal.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] for unknown sessions; store failures
    /// propagate.
    pub async fn signal(&self, signal: SessionSignal) -> Result<CloseOutcome> {
        let session = self
            .store
            .get(&signal.session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(signal.session_id.clone()))?;

        if !session.status.accepts_close() {
            debug!(
                session_id = %session.id,
                status = %session.status,
                reason = ?signal.reason,
                "Close signal ignored"
            );
            return Ok(CloseOutcome::Ignored {
                status: session.status,
            });
        }

        let terminal = signal.reason.terminal_status();
        let written = self
            .store
            .mark_terminal(&session.id, terminal, Utc::now())
            .await?;
        if !written {
            // Closed by another signal between the read and the write.
            let current = self
                .store
                .get(&session.id)
                .await?
                .map_or(session.status, |s| s.status);
            return Ok(CloseOutcome::Ignored { status: current });
        }

        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            from = %session.status,
            to = %terminal,
            "Session closed"
        );

        if signal.reason == CloseReason::NetworkFailure {
            self.notifiers.notify_all(Event::RestartRequired {
                session_id: session.id.clone(),
                user_id: session.user_id.clone(),
            });
        }

        let reconciliation = self
            .reconciler
            .dispatch(ReconcileRequest::for_session(&session, session.status));
        Ok(CloseOutcome::Closed {
            status: terminal,
            reconciliation,
        })
    }
}
