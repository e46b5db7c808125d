//! Monitor-driven session transitions.
//!
//! | From     | Condition                                   | To       |
//! |----------|---------------------------------------------|----------|
//! | `ready`  | bet within the recent window                | `active` |
//! | `active` | newest bet within `pause_after`             | `active` |
//! | `active` | `now - newest bet >= pause_after`           | `paused` |
//! | `paused` | bet within the recent window                | `active` |
//!
//! Time comparisons anchor on the bet record's own timestamp and the wall
//! clock of the tick. Every write is a compare-and-swap on the status the
//! decision was made from, so a session closed by its player mid-tick is
//! never resurrected.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::domain::{GameSession, SessionStatus, SessionUpdate};
use crate::error::{Result, SessionError};
use crate::port::outbound::bets::BetActivityReader;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::store::SessionStore;

/// Timing thresholds for the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// How far back a bet still counts as "recent" for activation.
    pub recent_bet_window: Duration,
    /// Idle time after the last bet before an active session pauses.
    pub pause_after: Duration,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            recent_bet_window: Duration::seconds(30),
            pause_after: Duration::minutes(4),
        }
    }
}

/// What the machine wants to do with one session on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stay,
    /// `ready`/`paused` -> `active`.
    Activate { bet_at: DateTime<Utc> },
    /// `active` with a newer bet that is still within the idle threshold.
    Refresh { bet_at: DateTime<Utc> },
    /// `active` -> `paused`. Carries a bet newer than `last_bet_at` that is
    /// itself past the threshold, so the paused row records it.
    Pause { bet_at: Option<DateTime<Utc>> },
}

/// Result of evaluating one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Unchanged,
    Applied {
        from: SessionStatus,
        to: SessionStatus,
    },
    /// The stored status moved on between read and write; nothing written.
    Conflict,
}

pub struct SessionMachine {
    config: MachineConfig,
    store: Arc<dyn SessionStore>,
    bets: Arc<dyn BetActivityReader>,
    ledger: Arc<dyn Ledger>,
}

impl SessionMachine {
    pub fn new(
        config: MachineConfig,
        store: Arc<dyn SessionStore>,
        bets: Arc<dyn BetActivityReader>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            config,
            store,
            bets,
            ledger,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Decide the transition for `session` at wall-clock `now`.
    pub async fn decide(&self, session: &GameSession, now: DateTime<Utc>) -> Result<Decision> {
        match session.status {
            SessionStatus::Ready | SessionStatus::Paused => {
                let since = now - self.config.recent_bet_window;
                let latest = self.bets.latest_bet_after(&session.user_id, since).await?;
                // A recent bet that predates this launch belongs to an earlier session.
                Ok(match latest {
                    Some(bet_at) if bet_at >= session.launched_at => Decision::Activate { bet_at },
                    _ => Decision::Stay,
                })
            }
            SessionStatus::Active => {
                let Some(last_bet_at) = session.last_bet_at else {
                    return Ok(Decision::Stay);
                };
                let newer = self
                    .bets
                    .latest_bet_after(&session.user_id, last_bet_at)
                    .await?;
                let newest = newer.unwrap_or(last_bet_at);
                if now - newest >= self.config.pause_after {
                    return Ok(Decision::Pause { bet_at: newer });
                }
                Ok(match newer {
                    Some(bet_at) => Decision::Refresh { bet_at },
                    None => Decision::Stay,
                })
            }
            SessionStatus::Ended | SessionStatus::ForceEnded => Ok(Decision::Stay),
        }
    }

    /// Evaluate one session and apply at most one transition.
    ///
    /// # Errors
    /// Read failures propagate as-is; a failed write is reported as
    /// [`SessionError::TransitionWrite`]. Both are safe to retry on the next
    /// tick because the decision is recomputed from fresh reads.
    pub async fn step(&self, session: &GameSession, now: DateTime<Utc>) -> Result<StepOutcome> {
        let decision = self.decide(session, now).await?;
        trace!(session_id = %session.id, status = %session.status, ?decision, "Decided");

        let next = match decision {
            Decision::Stay => return Ok(StepOutcome::Unchanged),
            Decision::Activate { bet_at } => {
                let snapshot = if session.balance_before.is_none() {
                    Some(self.ledger.balance(&session.user_id).await?)
                } else {
                    None
                };
                session.activated(bet_at, now, snapshot)?
            }
            Decision::Refresh { bet_at } => session.refreshed(bet_at, now)?,
            Decision::Pause { bet_at: None } => session.paused(now),
            Decision::Pause {
                bet_at: Some(bet_at),
            } => session.refreshed(bet_at, now)?.paused(now),
        };

        let update = SessionUpdate {
            expected: session.status,
            next,
        };
        let written = self.store.compare_and_set(&update).await.map_err(|e| {
            SessionError::TransitionWrite {
                session_id: session.id.clone(),
                reason: e.to_string(),
            }
        })?;

        if !written {
            debug!(
                session_id = %session.id,
                expected = %session.status,
                "Session changed underneath transition, skipped"
            );
            return Ok(StepOutcome::Conflict);
        }

        let to = update.next.status;
        if to != session.status {
            debug!(session_id = %session.id, from = %session.status, to = %to, "Session transitioned");
        }
        Ok(StepOutcome::Applied {
            from: session.status,
            to,
        })
    }
}
