use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{PartnerId, ProviderType, SessionId, UserId};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Session lifecycle errors.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// The store rejected a transition write. Retried on the next tick by
    /// re-evaluating the session from scratch.
    #[error("failed to write transition for session {session_id}: {reason}")]
    TransitionWrite {
        session_id: SessionId,
        reason: String,
    },

    #[error("session not found: {0}")]
    NotFound(SessionId),
}

/// Failures walking the partner hierarchy to a root credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialResolutionError {
    #[error("user {0} not found")]
    UnknownUser(UserId),

    #[error("user {0} has no referring partner")]
    NoReferrer(UserId),

    #[error("partner chain from {start} exceeded {max_hops} hops")]
    HopLimitExceeded { start: PartnerId, max_hops: usize },

    #[error("root partner {root} has no {provider} credential")]
    MissingCredential {
        root: PartnerId,
        provider: ProviderType,
    },
}

/// Failures talking to a provider wallet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalWalletError {
    #[error("wallet request failed: {0}")]
    Request(String),

    #[error("wallet responded with HTTP {0}")]
    Status(u16),

    #[error("malformed wallet response: {0}")]
    Malformed(String),

    #[error("wallet rejected request: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Credential(#[from] CredentialResolutionError),

    #[error(transparent)]
    Wallet(#[from] ExternalWalletError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
