//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams between the session lifecycle logic and everything
//! it treats as an external collaborator: the session/user/partner store, the
//! bet-record store, the provider wallets, the presence channel and the
//! notification layer.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │ election · machine ·    │
//!     ┌──────────────┤ monitor · reconcile     ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                    │            │                     │
//!     ▼                    ▼            ▼                     ▼
//! ┌─────────┐      ┌────────────┐ ┌──────────┐        ┌───────────┐
//! │Presence │      │   Store    │ │  Wallet  │        │ Notifier  │
//! │ Adapter │      │  Adapter   │ │  Adapter │        │  Adapter  │
//! └─────────┘      └────────────┘ └──────────┘        └───────────┘
//! ```

pub mod outbound;

pub use outbound::bets::BetActivityReader;
pub use outbound::ledger::Ledger;
pub use outbound::notifier::{Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier};
pub use outbound::partner::PartnerDirectory;
pub use outbound::presence::{Membership, PresenceChannel};
pub use outbound::store::SessionStore;
pub use outbound::wallet::WalletClient;
