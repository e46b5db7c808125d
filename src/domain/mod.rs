//! Domain types for game sessions, providers and the partner hierarchy.

pub mod error;
pub mod id;
pub mod provider;
pub mod session;

pub use id::{AdminId, PartnerId, PresenceToken, SessionId, UserId};
pub use provider::{ProviderCredential, ProviderType};
pub use session::{
    CloseReason, GameSession, SessionSignal, SessionStatus, SessionUpdate, UserAccount,
};
