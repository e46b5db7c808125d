//! Domain validation errors.
//!
//! Raised when stored or inbound values cannot be turned into domain types,
//! or when a session record would break one of its invariants.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A status string that is not one of the five session states.
    #[error("unknown session status '{0}'")]
    UnknownStatus(String),

    /// A provider name outside the supported set.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// A bet timestamp that predates the session launch.
    #[error("bet at {bet_at} predates session launch at {launched_at}")]
    BetBeforeLaunch {
        /// The offending bet timestamp.
        bet_at: DateTime<Utc>,
        /// When the session was launched.
        launched_at: DateTime<Utc>,
    },
}
