//! Croupier - game-session lifecycle manager for an online casino.
//!
//! Tracks each player's launched game session from launch to termination,
//! lets exactly one administrator process drive the periodic session
//! monitor, and reconciles the player's balance with the game provider's
//! wallet when a session ends.
//!
//! # Architecture
//!
//! - **`domain`** - Sessions, providers, partner hierarchy identifiers
//! - **`port`** - Traits for the store, bet records, wallets, presence and notifiers
//! - **`application`** - Leader election, session state machine, monitor, reconciliation
//! - **`adapter`** - SQLite/in-memory stores and presence, HTTP wallet client, HTTP API and CLI
//! - **`infrastructure`** - Configuration, bootstrap and runtime orchestration
//!
//! # Session lifecycle
//!
//! ```text
//!   launch ──► ready ──bet──► active ──idle──► paused
//!                │              │    ◄──bet────
//!                │              │
//!                └──────────────┴── close / network failure ──► ended | force_ended
//! ```
//!
//! A `paused` session ignores close signals and stays paused until a bet.
//!
//! # Example
//!
//! ```no_run
//! use croupier::infrastructure::config::settings::Config;
//!
//! # async fn run() -> croupier::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! croupier::infrastructure::orchestration::run(config).await
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
