//! Outbound adapters (driven side).

pub mod memory;
pub mod presence;
pub mod sqlite;
pub mod wallet;
