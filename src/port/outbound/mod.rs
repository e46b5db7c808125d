//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as storage,
//! provider wallets, presence and notifications.

pub mod bets;
pub mod ledger;
pub mod notifier;
pub mod partner;
pub mod presence;
pub mod store;
pub mod wallet;
