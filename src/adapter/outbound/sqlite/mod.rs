//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed session store, bet reader, partner directory
//! and ledger using Diesel ORM, plus presence shared by every administrator
//! on the same database.

pub mod database;
pub mod presence;
pub mod store;

pub use database::connection::{create_pool, open, run_migrations, DbPool};
pub use presence::{PresenceHandle, SqlitePresence};
pub use store::SqliteStore;
