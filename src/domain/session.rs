//! Game session record and its status machine vocabulary.
//!
//! A [`GameSession`] tracks one player's single game launch from `ready`
//! through one of the two terminal states. The transition *decisions* live in
//! the application layer; this module only knows how a session looks before
//! and after each kind of transition, and enforces the record invariants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{PartnerId, SessionId, UserId};
use super::provider::ProviderType;

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Launched, no bet observed yet.
    Ready,
    /// Player is betting.
    Active,
    /// No bet for the pause threshold; resumes on the next bet.
    Paused,
    /// Closed normally by the player's client.
    Ended,
    /// Closed because the player's client lost its connection.
    ForceEnded,
}

impl SessionStatus {
    /// Statuses the monitor evaluates on every tick.
    pub const LIVE: [SessionStatus; 3] = [
        SessionStatus::Ready,
        SessionStatus::Active,
        SessionStatus::Paused,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::ForceEnded => "force_ended",
        }
    }

    /// Terminal sessions are immutable.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::ForceEnded)
    }

    /// Close and network-failure signals only act on these statuses. The
    /// same check guards reconciliation against running twice.
    #[must_use]
    pub const fn accepts_close(self) -> bool {
        matches!(self, Self::Ready | Self::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "ended" => Ok(Self::Ended),
            "force_ended" => Ok(Self::ForceEnded),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Why the player's client reported the session as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Browser or game window closed normally.
    NormalClose,
    /// Transport failure on the player's connection.
    NetworkFailure,
}

impl CloseReason {
    /// The terminal status this reason leads to.
    #[must_use]
    pub const fn terminal_status(self) -> SessionStatus {
        match self {
            Self::NormalClose => SessionStatus::Ended,
            Self::NetworkFailure => SessionStatus::ForceEnded,
        }
    }
}

/// Inbound close signal from the player's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSignal {
    pub session_id: SessionId,
    pub reason: CloseReason,
}

/// One player's game launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub provider: ProviderType,
    pub status: SessionStatus,
    pub launched_at: DateTime<Utc>,
    pub last_bet_at: Option<DateTime<Utc>>,
    pub last_bet_checked_at: Option<DateTime<Utc>>,
    pub last_activity_at: DateTime<Utc>,
    /// Ledger balance captured on the first activation.
    pub balance_before: Option<Decimal>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Set while the session has never been activated.
    pub ready_marked_at: Option<DateTime<Utc>>,
}

impl GameSession {
    /// A freshly launched session in `ready`.
    #[must_use]
    pub fn launch(user_id: UserId, provider: ProviderType, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            provider,
            status: SessionStatus::Ready,
            launched_at: now,
            last_bet_at: None,
            last_bet_checked_at: None,
            last_activity_at: now,
            balance_before: None,
            ended_at: None,
            ready_marked_at: Some(now),
        }
    }

    /// `ready`/`paused` -> `active` on an observed bet.
    ///
    /// `balance_before` is only recorded if the session has none yet, so a
    /// resume after a pause keeps the snapshot from the first activation.
    ///
    /// # Errors
    /// Returns [`DomainError::BetBeforeLaunch`] if the bet predates launch.
    pub fn activated(
        &self,
        bet_at: DateTime<Utc>,
        now: DateTime<Utc>,
        balance_before: Option<Decimal>,
    ) -> Result<Self, DomainError> {
        self.check_bet(bet_at)?;
        let mut next = self.clone();
        next.status = SessionStatus::Active;
        next.last_bet_at = Some(bet_at);
        next.last_bet_checked_at = Some(now);
        next.last_activity_at = now;
        next.ready_marked_at = None;
        if next.balance_before.is_none() {
            next.balance_before = balance_before;
        }
        Ok(next)
    }

    /// `active` stays `active` with a newer `last_bet_at`.
    ///
    /// # Errors
    /// Returns [`DomainError::BetBeforeLaunch`] if the bet predates launch.
    pub fn refreshed(&self, bet_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.check_bet(bet_at)?;
        let mut next = self.clone();
        next.last_bet_at = Some(bet_at);
        next.last_bet_checked_at = Some(now);
        next.last_activity_at = now;
        Ok(next)
    }

    /// `active` -> `paused` after the idle threshold.
    #[must_use]
    pub fn paused(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = SessionStatus::Paused;
        next.last_bet_checked_at = Some(now);
        next.last_activity_at = now;
        next
    }

    /// Any live status -> the given terminal status.
    #[must_use]
    pub fn terminated(&self, status: SessionStatus, now: DateTime<Utc>) -> Self {
        debug_assert!(status.is_terminal());
        let mut next = self.clone();
        next.status = status;
        next.ended_at = Some(now);
        next.last_activity_at = now;
        next
    }

    fn check_bet(&self, bet_at: DateTime<Utc>) -> Result<(), DomainError> {
        if bet_at < self.launched_at {
            return Err(DomainError::BetBeforeLaunch {
                bet_at,
                launched_at: self.launched_at,
            });
        }
        Ok(())
    }
}

/// A compare-and-swap write: replace the stored session with `next` only if
/// its status is still `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub expected: SessionStatus,
    pub next: GameSession,
}

/// Player record fields needed for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user_id: UserId,
    /// Partner who referred the player; the start of the hierarchy walk.
    pub referrer: Option<PartnerId>,
    /// Account name on the provider side.
    pub external_username: String,
}
