//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`wallet`] - [`ScriptedWallet`](wallet::ScriptedWallet), a
//!   [`WalletClient`](crate::port::WalletClient) with queued responses.
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier),
//!   captures every event and lets tests await them.
//! - [`domain`] - Builders for sessions, credentials and partner chains.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod notifier;
pub mod wallet;
